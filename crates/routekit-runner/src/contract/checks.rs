//! Response and parameter checks

use std::collections::BTreeMap;

use routekit_core::{Endpoint, ParamType, ValidationResult, Violation};
use serde_json::Value;

/// Success classification: the observed status must be one of the declared
/// 2xx statuses, or exactly 200 when none are declared.
///
/// # Errors
///
/// Returns the human-readable mismatch, e.g. `"Expected status 201, got 200"`
pub fn check_status(endpoint: &Endpoint, status: u16) -> Result<(), String> {
    let mut expected = endpoint.success_statuses();
    if expected.is_empty() {
        expected.push(200);
    }
    if expected.contains(&status) {
        return Ok(());
    }
    let list: Vec<String> = expected.iter().map(u16::to_string).collect();
    Err(format!("Expected status {}, got {status}", list.join(" or ")))
}

/// Check `body` against the schema declared for `status`.
///
/// Passes trivially when no response is declared for the status or it has no
/// schema. Every violation is reported; an uncompilable schema is reported as
/// a single violation.
#[must_use]
pub fn validate_response(endpoint: &Endpoint, status: u16, body: &Value) -> ValidationResult {
    let Some(schema) = endpoint.response_for(status).and_then(|r| r.schema.as_ref()) else {
        return ValidationResult::pass(endpoint);
    };

    let validator = match jsonschema::validator_for(schema) {
        Ok(v) => v,
        Err(e) => {
            return ValidationResult::from_violations(
                endpoint,
                vec![Violation::new(format!("Invalid schema: {e}"))],
            );
        }
    };

    let errors: Vec<Violation> = validator
        .iter_errors(body)
        .map(|e| Violation::new(e.to_string()))
        .collect();
    ValidationResult::from_violations(endpoint, errors)
}

/// Check supplied parameter values against the declared parameters.
///
/// Missing required parameters are all reported and short-circuit the type
/// checks; otherwise every type mismatch is reported. Body parameters are
/// checked against their schema's type when they carry one.
#[must_use]
pub fn validate_params(endpoint: &Endpoint, supplied: &BTreeMap<String, Value>) -> ValidationResult {
    let missing: Vec<Violation> = endpoint
        .parameters
        .iter()
        .filter(|p| p.required && !supplied.contains_key(&p.name))
        .map(|p| Violation::for_parameter(&p.name, format!("Missing required parameter: {}", p.name)))
        .collect();
    if !missing.is_empty() {
        return ValidationResult::from_violations(endpoint, missing);
    }

    let mismatches: Vec<Violation> = endpoint
        .parameters
        .iter()
        .filter_map(|p| {
            let value = supplied.get(&p.name)?;
            let expected = p.effective_type();
            if matches_type(expected, value) {
                return None;
            }
            Some(Violation::for_parameter(
                &p.name,
                format!(
                    "Parameter '{}' should be of type {}, got {}",
                    p.name,
                    expected,
                    json_type_name(value)
                ),
            ))
        })
        .collect();
    ValidationResult::from_violations(endpoint, mismatches)
}

fn matches_type(expected: ParamType, value: &Value) -> bool {
    match expected {
        ParamType::String => value.is_string(),
        ParamType::Number | ParamType::Integer => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Array => value.is_array(),
        ParamType::Object => value.is_object(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
