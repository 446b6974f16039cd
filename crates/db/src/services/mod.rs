//! Operations that span repositories and enforce domain rules before
//! anything is written.

pub mod config_service;
pub mod scene_service;

pub use config_service::ConfigService;
pub use scene_service::SceneService;
