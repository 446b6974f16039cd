//! Deterministic config identities.
//!
//! Format: `{scene_id}:default` for the unconditioned document, otherwise
//! `{scene_id}:{key1}:{value1},{key2}:{value2}` with pairs in canonical
//! (key-sorted) order.
//!
//! ```
//! use chamberlain_core::condition::Condition;
//! use chamberlain_core::identity::generate_identity;
//!
//! let conditions = [
//!     Condition::new("region", "us-west"),
//!     Condition::new("environment", "production"),
//! ];
//! assert_eq!(
//!     generate_identity("test_scene", &conditions).unwrap(),
//!     "test_scene:environment:production,region:us-west"
//! );
//! ```

use crate::condition::{canonical_form, Condition, LIST_SEPARATOR, PAIR_SEPARATOR};
use crate::error::CoreError;

/// Suffix used for the scene's default (empty condition set) document.
pub const DEFAULT_SUFFIX: &str = "default";

/// Build the identity for a scene and condition set.
pub fn generate_identity(scene_id: &str, conditions: &[Condition]) -> Result<String, CoreError> {
    if scene_id.is_empty() {
        return Err(CoreError::InvalidArgument(
            "Scene ID must not be empty".to_string(),
        ));
    }

    if conditions.is_empty() {
        return Ok(format!("{scene_id}{PAIR_SEPARATOR}{DEFAULT_SUFFIX}"));
    }

    Ok(format!(
        "{scene_id}{PAIR_SEPARATOR}{}",
        canonical_form(conditions)
    ))
}

/// Whether `identity` has non-empty text on both sides of its first `:`.
pub fn is_valid_identity(identity: &str) -> bool {
    match identity.split_once(PAIR_SEPARATOR) {
        Some((scene, rest)) => !scene.is_empty() && !rest.is_empty(),
        None => false,
    }
}

/// Return the scene id portion of an identity.
pub fn extract_scene_id(identity: &str) -> Result<&str, CoreError> {
    match identity.split_once(PAIR_SEPARATOR) {
        Some((scene, rest)) if !scene.is_empty() && !rest.is_empty() => Ok(scene),
        _ => Err(CoreError::InvalidArgument(format!(
            "Invalid config ID: {identity}"
        ))),
    }
}

/// An identity split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentity {
    pub scene_id: String,
    pub conditions: Vec<Condition>,
}

/// Split an identity into scene id and conditions.
///
/// Each pair is split on its first `:`; a pair without one yields an empty
/// value. The `default` suffix yields no conditions.
pub fn parse_identity(identity: &str) -> Result<ParsedIdentity, CoreError> {
    let scene_id = extract_scene_id(identity)?;
    let rest = &identity[scene_id.len() + PAIR_SEPARATOR.len_utf8()..];

    let conditions = if rest == DEFAULT_SUFFIX {
        Vec::new()
    } else {
        rest.split(LIST_SEPARATOR)
            .map(|pair| match pair.split_once(PAIR_SEPARATOR) {
                Some((key, value)) => Condition::new(key, value),
                None => Condition::new(pair, ""),
            })
            .collect()
    };

    Ok(ParsedIdentity {
        scene_id: scene_id.to_string(),
        conditions,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn conds(pairs: &[(&str, &str)]) -> Vec<Condition> {
        pairs.iter().map(|(k, v)| Condition::new(*k, *v)).collect()
    }

    // -- generate_identity ---------------------------------------------------

    #[test]
    fn empty_conditions_yield_default() {
        assert_eq!(generate_identity("scene", &[]).unwrap(), "scene:default");
    }

    #[test]
    fn conditions_are_key_sorted() {
        let id = generate_identity(
            "test_scene",
            &conds(&[("region", "us-west"), ("environment", "production")]),
        )
        .unwrap();
        assert_eq!(id, "test_scene:environment:production,region:us-west");
    }

    #[test]
    fn single_condition() {
        let id = generate_identity("pay", &conds(&[("env", "prod")])).unwrap();
        assert_eq!(id, "pay:env:prod");
    }

    #[test]
    fn every_permutation_yields_same_identity() {
        let base = [("a", "1"), ("b", "2"), ("c", "3")];
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let expected = generate_identity("s", &conds(&base)).unwrap();
        for order in orders {
            let permuted: Vec<_> = order.iter().map(|&i| base[i]).collect();
            assert_eq!(generate_identity("s", &conds(&permuted)).unwrap(), expected);
        }
    }

    #[test]
    fn empty_scene_id_rejected() {
        assert_matches!(
            generate_identity("", &[]),
            Err(CoreError::InvalidArgument(_))
        );
    }

    // -- is_valid_identity ---------------------------------------------------

    #[test]
    fn valid_identities() {
        assert!(is_valid_identity("scene:default"));
        assert!(is_valid_identity("test_scene:env:prod"));
    }

    #[test]
    fn invalid_identities() {
        assert!(!is_valid_identity(""));
        assert!(!is_valid_identity("invalid"));
        assert!(!is_valid_identity(":default"));
        assert!(!is_valid_identity("scene:"));
    }

    // -- extract_scene_id ----------------------------------------------------

    #[test]
    fn extracts_text_before_first_separator() {
        assert_eq!(extract_scene_id("test_scene:env:prod").unwrap(), "test_scene");
        assert_eq!(extract_scene_id("scene:default").unwrap(), "scene");
    }

    #[test]
    fn extract_from_invalid_identity_fails() {
        assert_matches!(
            extract_scene_id("invalid"),
            Err(CoreError::InvalidArgument(_))
        );
        assert_matches!(extract_scene_id(""), Err(CoreError::InvalidArgument(_)));
    }

    // -- parse_identity ------------------------------------------------------

    #[test]
    fn parse_default_identity() {
        let parsed = parse_identity("scene:default").unwrap();
        assert_eq!(parsed.scene_id, "scene");
        assert!(parsed.conditions.is_empty());
    }

    #[test]
    fn parse_reverses_generate() {
        let conditions = conds(&[("environment", "production"), ("region", "us-west")]);
        let id = generate_identity("test_scene", &conditions).unwrap();
        let parsed = parse_identity(&id).unwrap();
        assert_eq!(parsed.scene_id, "test_scene");
        assert_eq!(parsed.conditions, conditions);
    }

    #[test]
    fn parse_invalid_identity_fails() {
        assert!(parse_identity("nope").is_err());
    }
}
