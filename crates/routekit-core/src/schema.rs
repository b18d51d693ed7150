//! JSON Schema for the endpoint-list interchange format

use crate::model::Endpoint;

/// Pretty-printed JSON Schema describing a `Vec<Endpoint>` document.
///
/// # Errors
///
/// Returns error if the generated schema cannot be serialized
pub fn generate_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(Vec<Endpoint>);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_an_array_of_endpoints() {
        let schema: serde_json::Value = serde_json::from_str(&generate_schema().unwrap()).unwrap();
        assert_eq!(schema["type"], "array");
        let endpoint = &schema["$defs"]["Endpoint"];
        let required = endpoint["required"].as_array().unwrap();
        assert!(required.iter().any(|r| r == "path"));
        assert!(required.iter().any(|r| r == "method"));
        assert!(endpoint["properties"].get("deprecated").is_some());
    }

    #[test]
    fn uses_wire_field_names() {
        let schema: serde_json::Value = serde_json::from_str(&generate_schema().unwrap()).unwrap();
        let param = &schema["$defs"]["Parameter"]["properties"];
        assert!(param.get("in").is_some());
        assert!(param.get("type").is_some());
        assert!(param.get("enum").is_some());
        let response = &schema["$defs"]["ResponseSpec"]["properties"];
        assert!(response.get("statusCode").is_some());
        assert!(response.get("format").is_some());
    }
}
