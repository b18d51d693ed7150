//! Deterministic JSON Schema → `serde_json::Value` generator
//!
//! Recognised shape: `{ type, items?, properties?, example?, default?, $ref? }`.
//! Precedence at every node is override (by property name), then `example`,
//! then `default`, then a fixed placeholder. Unknown or missing types degrade
//! to an empty object; nothing here fails.

use std::collections::BTreeMap;

use routekit_core::{ParamType, Parameter};
use serde_json::{Map, Value, json};

/// Placeholder for string schemas with no example or default.
pub const STRING_PLACEHOLDER: &str = "test-string";

/// Placeholder for number and integer schemas.
pub const NUMBER_PLACEHOLDER: i64 = 123;

/// Generate a value for `schema`, substituting `overrides` by property name.
///
/// `$ref` nodes are not followed: they yield an empty object.
#[must_use]
pub fn generate(schema: &Value, overrides: &BTreeMap<String, Value>) -> Value {
    if schema.get("$ref").is_some() {
        return Value::Object(Map::new());
    }

    let type_str = schema.get("type").and_then(Value::as_str).unwrap_or("");
    match type_str {
        "string" => example_or_default(schema).unwrap_or_else(|| json!(STRING_PLACEHOLDER)),
        "number" | "integer" => {
            example_or_default(schema).unwrap_or_else(|| json!(NUMBER_PLACEHOLDER))
        }
        "boolean" => example_or_default(schema).unwrap_or(Value::Bool(true)),
        "array" => match schema.get("items") {
            Some(items) => Value::Array(vec![generate(items, overrides)]),
            None => Value::Array(Vec::new()),
        },
        "object" => gen_object(schema, overrides),
        _ => Value::Object(Map::new()),
    }
}

fn example_or_default(schema: &Value) -> Option<Value> {
    schema
        .get("example")
        .or_else(|| schema.get("default"))
        .cloned()
}

fn gen_object(schema: &Value, overrides: &BTreeMap<String, Value>) -> Value {
    let mut obj = Map::new();
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (key, prop_schema) in props {
            let value = match overrides.get(key) {
                Some(v) => v.clone(),
                None => generate(prop_schema, overrides),
            };
            obj.insert(key.clone(), value);
        }
    }
    Value::Object(obj)
}

/// Value for a non-body parameter: override, example, default, then a
/// placeholder chosen by the declared type.
#[must_use]
pub fn param_value(param: &Parameter, overrides: &BTreeMap<String, Value>) -> Value {
    if let Some(v) = overrides.get(&param.name) {
        return v.clone();
    }
    if let Some(v) = param.example.as_ref().or(param.default.as_ref()) {
        return v.clone();
    }
    match param.param_type {
        ParamType::String => Value::String(format!("test-{}", param.name)),
        ParamType::Number | ParamType::Integer => json!(NUMBER_PLACEHOLDER),
        ParamType::Boolean => Value::Bool(true),
        ParamType::Array => Value::Array(Vec::new()),
        ParamType::Object => Value::Object(Map::new()),
    }
}

/// Render a value for a path segment, query string, or header.
#[must_use]
pub fn value_to_param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit_core::ParamLocation;

    fn none() -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    #[test]
    fn override_beats_example_beats_placeholder() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "string", "example": "e"}}});
        let overrides = BTreeMap::from([("x".to_string(), json!("override"))]);
        assert_eq!(generate(&schema, &overrides), json!({"x": "override"}));
        assert_eq!(generate(&schema, &none()), json!({"x": "e"}));

        let bare = json!({"type": "object", "properties": {"x": {"type": "string"}}});
        assert_eq!(generate(&bare, &none()), json!({"x": "test-string"}));
    }

    #[test]
    fn default_used_when_no_example() {
        assert_eq!(generate(&json!({"type": "integer", "default": 7}), &none()), json!(7));
        assert_eq!(
            generate(&json!({"type": "boolean", "default": false}), &none()),
            json!(false)
        );
        assert_eq!(
            generate(&json!({"type": "number", "example": 1.5, "default": 2}), &none()),
            json!(1.5)
        );
    }

    #[test]
    fn scalar_placeholders() {
        assert_eq!(generate(&json!({"type": "number"}), &none()), json!(123));
        assert_eq!(generate(&json!({"type": "integer"}), &none()), json!(123));
        assert_eq!(generate(&json!({"type": "boolean"}), &none()), json!(true));
    }

    #[test]
    fn arrays_hold_one_generated_item() {
        assert_eq!(
            generate(&json!({"type": "array", "items": {"type": "integer"}}), &none()),
            json!([123])
        );
        assert_eq!(generate(&json!({"type": "array"}), &none()), json!([]));
    }

    #[test]
    fn objects_recurse_and_default_empty() {
        assert_eq!(generate(&json!({"type": "object"}), &none()), json!({}));
        let nested = json!({"type": "object", "properties": {
            "tags": {"type": "array", "items": {"type": "object", "properties": {"id": {"type": "integer"}}}},
            "owner": {"type": "object", "properties": {"name": {"type": "string"}}}
        }});
        let overrides = BTreeMap::from([("name".to_string(), json!("ann"))]);
        assert_eq!(
            generate(&nested, &overrides),
            json!({"tags": [{"id": 123}], "owner": {"name": "ann"}})
        );
    }

    #[test]
    fn refs_and_unknown_types_are_empty_objects() {
        assert_eq!(generate(&json!({"$ref": "#/components/schemas/Pet"}), &none()), json!({}));
        assert_eq!(generate(&json!({"type": "null"}), &none()), json!({}));
        assert_eq!(generate(&json!({}), &none()), json!({}));
        assert_eq!(generate(&json!("not a schema"), &none()), json!({}));
    }

    #[test]
    fn param_value_precedence() {
        let mut p = Parameter::new("id", ParamLocation::Path, ParamType::Integer);
        assert_eq!(param_value(&p, &none()), json!(123));
        p.default = Some(json!(5));
        assert_eq!(param_value(&p, &none()), json!(5));
        p.example = Some(json!(9));
        assert_eq!(param_value(&p, &none()), json!(9));
        let overrides = BTreeMap::from([("id".to_string(), json!(42))]);
        assert_eq!(param_value(&p, &overrides), json!(42));
    }

    #[test]
    fn param_value_placeholders_by_type() {
        let value = |t| param_value(&Parameter::new("q", ParamLocation::Query, t), &none());
        assert_eq!(value(ParamType::String), json!("test-q"));
        assert_eq!(value(ParamType::Number), json!(123));
        assert_eq!(value(ParamType::Boolean), json!(true));
        assert_eq!(value(ParamType::Array), json!([]));
        assert_eq!(value(ParamType::Object), json!({}));
    }

    #[test]
    fn param_strings() {
        assert_eq!(value_to_param_string(&json!("a b")), "a b");
        assert_eq!(value_to_param_string(&json!(12)), "12");
        assert_eq!(value_to_param_string(&json!(true)), "true");
    }
}
