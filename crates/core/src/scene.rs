//! Scene identifiers, condition catalogs, and conflict strategies.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::condition::contains_separator;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a scene id (matches the `scenes.id` column).
pub const MAX_SCENE_ID_LENGTH: usize = 128;

/// Maximum length of a scene display name.
pub const MAX_SCENE_NAME_LENGTH: usize = 255;

/// Scene ids start with a lowercase letter and continue with lowercase
/// letters, digits, or underscores.
pub const SCENE_ID_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

static SCENE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCENE_ID_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a scene id against [`SCENE_ID_PATTERN`] and the length limit.
pub fn validate_scene_id(id: &str) -> Result<(), CoreError> {
    if id.len() > MAX_SCENE_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "Scene ID exceeds maximum length of {MAX_SCENE_ID_LENGTH} characters"
        )));
    }
    if !SCENE_ID_RE.is_match(id) {
        return Err(CoreError::Validation(format!(
            "Scene ID '{id}' must start with a lowercase letter and contain only \
             lowercase letters, digits, and underscores"
        )));
    }
    Ok(())
}

/// Validate a scene display name: non-empty after trimming and within the
/// length limit.
pub fn validate_scene_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Scene name must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_SCENE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Scene name exceeds maximum length of {MAX_SCENE_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Condition catalog
// ---------------------------------------------------------------------------

/// A condition key a scene declares as available for its configs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCondition {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
}

/// Validate a scene's condition catalog: keys non-empty, unique, and free of
/// identity separator characters.
pub fn validate_available_conditions(catalog: &[AvailableCondition]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(catalog.len());
    for entry in catalog {
        if entry.key.trim().is_empty() {
            return Err(CoreError::Validation(
                "Available condition key must not be empty".to_string(),
            ));
        }
        if contains_separator(&entry.key) {
            return Err(CoreError::Validation(format!(
                "Available condition key '{}' must not contain ':' or ','",
                entry.key
            )));
        }
        if !seen.insert(entry.key.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate available condition key '{}'",
                entry.key
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Conflict strategy
// ---------------------------------------------------------------------------

/// How overlapping condition sets are meant to be disambiguated when
/// resolving the effective config at read time.
///
/// Only declared here; no resolver consumes it yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictStrategy {
    /// Match by condition list order.
    #[default]
    Priority,
    /// Prefer the document matching the most conditions.
    BestMatch,
    /// Require an exact match on all conditions.
    Strict,
}

impl ConflictStrategy {
    /// Database and wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priority => "PRIORITY",
            Self::BestMatch => "BEST_MATCH",
            Self::Strict => "STRICT",
        }
    }
}

impl std::str::FromStr for ConflictStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIORITY" => Ok(Self::Priority),
            "BEST_MATCH" => Ok(Self::BestMatch),
            "STRICT" => Ok(Self::Strict),
            other => Err(CoreError::Validation(format!(
                "Unknown conflict strategy '{other}'. Must be one of: PRIORITY, BEST_MATCH, STRICT"
            ))),
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
