//! Config document model and DTOs.

use chamberlain_core::condition::Condition;
use chamberlain_core::types::{Timestamp, VersionNumber};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `configs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Config {
    /// Deterministic identity, e.g. `payment:env:prod,region:eu`.
    pub id: String,
    pub scene_id: String,
    pub scheme_version: VersionNumber,
    /// Conditions in canonical (key-sorted) order.
    pub condition_list: Json<Vec<Condition>>,
    pub condition_hash: String,
    pub config_data: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a config document.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConfig {
    pub scene_id: String,
    pub scheme_version: VersionNumber,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub config: serde_json::Value,
}

/// DTO for updating a config document. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateConfig {
    pub scheme_version: Option<VersionNumber>,
    pub conditions: Option<Vec<Condition>>,
    pub config: Option<serde_json::Value>,
}

/// DTO for copying a config's payload to another condition set.
#[derive(Debug, Clone, Deserialize)]
pub struct CopyConfig {
    #[serde(default)]
    pub to_conditions: Vec<Condition>,
}

/// Filter for listing configs of a scene.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFilter {
    pub scene_id: String,
    pub scheme_version: Option<VersionNumber>,
}

/// Column values computed for a config row before it is written.
#[derive(Debug, Clone)]
pub struct ConfigRecord {
    pub id: String,
    pub scene_id: String,
    pub scheme_version: VersionNumber,
    pub condition_list: Vec<Condition>,
    pub condition_hash: String,
    pub config_data: serde_json::Value,
}
