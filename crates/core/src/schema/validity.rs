//! Structural validity checks for scheme documents and payload validation.
//!
//! A scheme must be a JSON object whose optional `properties` is an object
//! of property definitions and whose optional `required` is an array of
//! strings, and it must compile as a JSON Schema. Invalid schemes never
//! reach the compatibility analyzer.

use serde_json::Value;

use crate::error::CoreError;

/// Check that `schema` is a structurally valid scheme document.
pub fn check_schema(schema: &Value) -> Result<(), CoreError> {
    let obj = schema
        .as_object()
        .ok_or_else(|| CoreError::InvalidSchema("Schema must be a JSON object".to_string()))?;

    if let Some(props) = obj.get("properties") {
        let props = props.as_object().ok_or_else(|| {
            CoreError::InvalidSchema("'properties' must be a JSON object".to_string())
        })?;
        for (name, definition) in props {
            if !(definition.is_object() || definition.is_boolean()) {
                return Err(CoreError::InvalidSchema(format!(
                    "Property '{name}' must be a schema object or boolean"
                )));
            }
        }
    }

    if let Some(required) = obj.get("required") {
        let entries = required.as_array().ok_or_else(|| {
            CoreError::InvalidSchema("'required' must be an array".to_string())
        })?;
        if entries.iter().any(|entry| !entry.is_string()) {
            return Err(CoreError::InvalidSchema(
                "'required' entries must be strings".to_string(),
            ));
        }
    }

    jsonschema::validator_for(schema)
        .map_err(|e| CoreError::InvalidSchema(format!("Schema does not compile: {e}")))?;

    Ok(())
}

/// Boolean form of [`check_schema`].
pub fn is_valid_schema(schema: &Value) -> bool {
    match check_schema(schema) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(error = %err, "Rejected schema");
            false
        }
    }
}

/// Validate a config payload against a scheme.
///
/// All violations are reported together as `"{path}: {message}"` entries
/// joined by `"; "`. An empty path is reported as `/`.
pub fn validate_payload(schema: &Value, payload: &Value) -> Result<(), CoreError> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| CoreError::InvalidSchema(format!("Schema does not compile: {e}")))?;

    let errors: Vec<String> = validator
        .iter_errors(payload)
        .map(|err| {
            let path = err.instance_path.to_string();
            let path = if path.is_empty() { "/".to_string() } else { path };
            format!("{path}: {err}")
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Config does not conform to schema: {}",
            errors.join("; ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
