//! SHA-256 digests and condition-set content hashes.
//!
//! The condition hash is stored alongside each config so storage can find
//! a document with the same condition set without comparing lists.

use sha2::{Digest, Sha256};

use crate::condition::{canonical_form, Condition};

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Hash a condition set via its canonical form.
///
/// The empty set hashes the empty string, so every scene's default config
/// shares the same hash.
pub fn hash_conditions(conditions: &[Condition]) -> String {
    sha256_hex(canonical_form(conditions).as_bytes())
}

/// Whether two condition sets are equal as sets of pairs.
pub fn conditions_equal(a: &[Condition], b: &[Condition]) -> bool {
    hash_conditions(a) == hash_conditions(b)
}
