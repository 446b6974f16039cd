//! Domain logic for scene-scoped, versioned configuration.
//!
//! Everything in this crate is pure computation or runs against the
//! [`scheme_version::SchemeStore`] seam; there is no database dependency.

pub mod condition;
pub mod error;
pub mod hashing;
pub mod identity;
pub mod scene;
pub mod schema;
pub mod scheme_version;
pub mod types;
