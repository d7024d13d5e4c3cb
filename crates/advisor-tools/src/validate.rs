//! Schema validation for tool invocations
//!
//! The decision model is an untrusted planner: every invocation it
//! produces is checked here against the tool's advertised schema before
//! dispatch. Invalid invocations fail closed with
//! [`advisor_core::Error::InvalidToolRequest`]; they are never coerced.

use advisor_core::{Error, Result};
use serde_json::Value;

/// Validate an argument object against a tool's JSON schema
///
/// Checks that `args` is an object, that every `required` property is
/// present, and that each provided property matches its declared type
/// (plus `enum` membership and integer `minimum`/`maximum` bounds when
/// declared). Properties not named in the schema are passed through.
pub fn validate_args(schema: &Value, args: &Value) -> Result<()> {
    let Some(args_map) = args.as_object() else {
        return Err(Error::InvalidToolRequest(format!(
            "arguments must be a JSON object, got {}",
            type_name(args)
        )));
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !args_map.contains_key(field) {
                return Err(Error::InvalidToolRequest(format!(
                    "missing required field '{field}'"
                )));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, value) in args_map {
        let Some(spec) = properties.get(name) else {
            continue;
        };
        validate_property(name, spec, value)?;
    }

    Ok(())
}

fn validate_property(name: &str, spec: &Value, value: &Value) -> Result<()> {
    if let Some(expected) = spec.get("type").and_then(Value::as_str) {
        let matches = match expected {
            "string" => value.is_string(),
            "number" => value.is_number(),
            "integer" => value.is_i64() || value.is_u64(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        };
        if !matches {
            return Err(Error::InvalidToolRequest(format!(
                "field '{name}' must be of type {expected}, got {}",
                type_name(value)
            )));
        }
    }

    if let Some(allowed) = spec.get("enum").and_then(Value::as_array) {
        if !allowed.contains(value) {
            return Err(Error::InvalidToolRequest(format!(
                "field '{name}' must be one of {allowed:?}"
            )));
        }
    }

    if let Some(n) = value.as_i64() {
        if let Some(min) = spec.get("minimum").and_then(Value::as_i64) {
            if n < min {
                return Err(Error::InvalidToolRequest(format!(
                    "field '{name}' must be >= {min}"
                )));
            }
        }
        if let Some(max) = spec.get("maximum").and_then(Value::as_i64) {
            if n > max {
                return Err(Error::InvalidToolRequest(format!(
                    "field '{name}' must be <= {max}"
                )));
            }
        }
    }

    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
