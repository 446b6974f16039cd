//! JSON Schema handling for scene schemes.
//!
//! Provides structural validity checking, payload validation, and the
//! shallow compatibility analysis used to classify breaking changes
//! between scheme versions.

pub mod compat;
pub mod validity;

use serde_json::{Map, Value};

/// Top-level `properties` map of a schema, or `None` when absent or not an
/// object.
pub(crate) fn properties(schema: &Value) -> Option<&Map<String, Value>> {
    schema.get("properties").and_then(Value::as_object)
}

/// Top-level `required` entries of a schema in declaration order. Missing,
/// non-array, and non-string entries contribute nothing.
pub(crate) fn required_fields(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
