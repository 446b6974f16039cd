//! Breaking-change classification between two schema revisions.
//!
//! Only top-level `properties` and `required` are compared; nested schemas
//! are not walked. A change is breaking when it:
//!
//! 1. removes a property,
//! 2. changes the declared `type` of a property that had one, or
//! 3. adds a name to `required` that was not required before.
//!
//! Adding optional properties, dropping a `required` entry, and editing
//! metadata are not breaking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{properties, required_fields};

/// One detected breaking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaChange {
    FieldRemoved {
        field: String,
    },
    TypeChanged {
        field: String,
        old_type: String,
        new_type: String,
    },
    NewlyRequired {
        field: String,
    },
}

impl std::fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldRemoved { field } => write!(f, "field '{field}' was removed"),
            Self::TypeChanged {
                field,
                old_type,
                new_type,
            } => write!(
                f,
                "field '{field}' type changed from '{old_type}' to '{new_type}'"
            ),
            Self::NewlyRequired { field } => write!(f, "field '{field}' is now required"),
        }
    }
}

/// Declared `type` of a property definition, or `""` when absent or not a
/// string.
fn declared_type(definition: &Value) -> &str {
    definition.get("type").and_then(Value::as_str).unwrap_or("")
}

/// Collect every breaking event between `old` and `new`.
///
/// Events are ordered: removals, then type changes (each by property key),
/// then newly required fields in the new schema's `required` order. A name
/// listed more than once in `required` is reported once.
pub fn analyze(old: &Value, new: &Value) -> Vec<SchemaChange> {
    let empty = serde_json::Map::new();
    let old_props = properties(old).unwrap_or(&empty);
    let new_props = properties(new).unwrap_or(&empty);

    let mut changes = Vec::new();

    for field in old_props.keys() {
        if !new_props.contains_key(field) {
            changes.push(SchemaChange::FieldRemoved {
                field: field.clone(),
            });
        }
    }

    for (field, old_def) in old_props {
        let Some(new_def) = new_props.get(field) else {
            continue;
        };
        let old_type = declared_type(old_def);
        let new_type = declared_type(new_def);
        if !old_type.is_empty() && old_type != new_type {
            changes.push(SchemaChange::TypeChanged {
                field: field.clone(),
                old_type: old_type.to_string(),
                new_type: new_type.to_string(),
            });
        }
    }

    let old_required = required_fields(old);
    let mut seen = HashSet::new();
    for field in required_fields(new) {
        if !seen.insert(field) {
            continue;
        }
        if !old_required.contains(&field) {
            changes.push(SchemaChange::NewlyRequired {
                field: field.to_string(),
            });
        }
    }

    for change in &changes {
        tracing::debug!(%change, "Breaking schema change detected");
    }

    changes
}

/// Whether moving from `old` to `new` is a breaking change.
pub fn is_breaking_change(old: &Value, new: &Value) -> bool {
    !analyze(old, new).is_empty()
}

/// Human-readable warnings, one per detected event.
pub fn diff_schemas(old: &Value, new: &Value) -> Vec<String> {
    analyze(old, new).iter().map(ToString::to_string).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
