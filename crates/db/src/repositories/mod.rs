//! Repository layer: one zero-sized struct per table.
//!
//! Read methods take `&PgPool`. Writes that must commit together with
//! another table take the caller's transaction instead.

pub mod config_repo;
pub mod scene_repo;
pub mod scheme_version_repo;

pub use config_repo::ConfigRepo;
pub use scene_repo::SceneRepo;
pub use scheme_version_repo::SchemeVersionRepo;
