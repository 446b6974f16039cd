//! Condition pairs and their canonical form.
//!
//! A condition is a `(key, value)` pair scoping when a config document
//! applies, e.g. `environment=production`. Identities and hashes are derived
//! from the canonical form: pairs sorted by key and rendered as
//! `key:value` joined by `,`.
//!
//! The encoding does not escape separators. Callers that persist conditions
//! go through [`validate_conditions`], which rejects keys and values that
//! contain `:` or `,`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Separator between a condition key and its value, and between the scene
/// id and the condition part of an identity.
pub const PAIR_SEPARATOR: char = ':';

/// Separator between rendered condition pairs.
pub const LIST_SEPARATOR: char = ',';

/// A single `(key, value)` scoping condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    pub key: String,
    pub value: String,
}

impl Condition {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{PAIR_SEPARATOR}{}", self.key, self.value)
    }
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Return the conditions ordered ascending by key.
///
/// Keys are expected to be unique; identical keys fall back to ordering by
/// value so the result never depends on input order.
pub fn canonicalize(conditions: &[Condition]) -> Vec<Condition> {
    let mut sorted = conditions.to_vec();
    sorted.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.value.cmp(&b.value)));
    sorted
}

/// Render the canonical `key:value,key:value` string. Empty input renders
/// as the empty string.
pub fn canonical_form(conditions: &[Condition]) -> String {
    canonicalize(conditions)
        .iter()
        .map(Condition::to_string)
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the write-boundary precondition for a condition set: keys are
/// non-empty and unique, and no key or value contains a separator.
pub fn validate_conditions(conditions: &[Condition]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(conditions.len());
    for condition in conditions {
        if condition.key.trim().is_empty() {
            return Err(CoreError::Validation(
                "Condition key must not be empty".to_string(),
            ));
        }
        if contains_separator(&condition.key) || contains_separator(&condition.value) {
            return Err(CoreError::Validation(format!(
                "Condition '{condition}' must not contain '{PAIR_SEPARATOR}' or \
                 '{LIST_SEPARATOR}' in its key or value"
            )));
        }
        if !seen.insert(condition.key.as_str()) {
            return Err(CoreError::Validation(format!(
                "Duplicate condition key '{}'",
                condition.key
            )));
        }
    }
    Ok(())
}

/// Whether `s` contains either separator character.
pub(crate) fn contains_separator(s: &str) -> bool {
    s.contains(PAIR_SEPARATOR) || s.contains(LIST_SEPARATOR)
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Whether every pair in `query` is present in `target`.
///
/// An empty query matches any target.
pub fn matches_conditions(target: &[Condition], query: &[Condition]) -> bool {
    query.iter().all(|q| target.contains(q))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn conds(pairs: &[(&str, &str)]) -> Vec<Condition> {
        pairs.iter().map(|(k, v)| Condition::new(*k, *v)).collect()
    }

    // -- canonicalize --------------------------------------------------------

    #[test]
    fn canonicalize_sorts_by_key() {
        let input = conds(&[("region", "us-west"), ("environment", "production")]);
        let out = canonicalize(&input);
        assert_eq!(out[0].key, "environment");
        assert_eq!(out[1].key, "region");
    }

    #[test]
    fn canonicalize_empty_is_empty() {
        assert!(canonicalize(&[]).is_empty());
        assert_eq!(canonical_form(&[]), "");
    }

    #[test]
    fn canonical_form_is_permutation_invariant() {
        let a = conds(&[("c", "3"), ("a", "1"), ("b", "2")]);
        let b = conds(&[("b", "2"), ("c", "3"), ("a", "1")]);
        let c = conds(&[("a", "1"), ("b", "2"), ("c", "3")]);
        assert_eq!(canonical_form(&a), "a:1,b:2,c:3");
        assert_eq!(canonical_form(&a), canonical_form(&b));
        assert_eq!(canonical_form(&b), canonical_form(&c));
    }

    #[test]
    fn canonicalize_does_not_mutate_input() {
        let input = conds(&[("z", "1"), ("a", "2")]);
        let _ = canonicalize(&input);
        assert_eq!(input[0].key, "z");
    }

    // -- validate_conditions -------------------------------------------------

    #[test]
    fn valid_conditions_accepted() {
        let input = conds(&[("environment", "production"), ("region", "us-west")]);
        assert!(validate_conditions(&input).is_ok());
        assert!(validate_conditions(&[]).is_ok());
    }

    #[test]
    fn duplicate_key_rejected() {
        let input = conds(&[("env", "prod"), ("env", "dev")]);
        assert!(validate_conditions(&input).is_err());
    }

    #[test]
    fn separator_in_value_rejected() {
        assert!(validate_conditions(&conds(&[("url", "http://x")])).is_err());
        assert!(validate_conditions(&conds(&[("tags", "a,b")])).is_err());
    }

    #[test]
    fn separator_in_key_rejected() {
        assert!(validate_conditions(&conds(&[("a:b", "x")])).is_err());
    }

    #[test]
    fn blank_key_rejected() {
        assert!(validate_conditions(&conds(&[("  ", "x")])).is_err());
    }

    // -- matches_conditions --------------------------------------------------

    #[test]
    fn subset_query_matches() {
        let target = conds(&[("env", "prod"), ("region", "eu")]);
        assert!(matches_conditions(&target, &conds(&[("region", "eu")])));
        assert!(matches_conditions(&target, &[]));
    }

    #[test]
    fn mismatched_value_does_not_match() {
        let target = conds(&[("env", "prod")]);
        assert!(!matches_conditions(&target, &conds(&[("env", "dev")])));
        assert!(!matches_conditions(&[], &conds(&[("env", "prod")])));
    }
}
