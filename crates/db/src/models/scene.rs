//! Scene entity model and DTOs.

use chamberlain_core::error::CoreError;
use chamberlain_core::scene::{AvailableCondition, ConflictStrategy};
use chamberlain_core::scheme_version::SchemeVersion;
use chamberlain_core::types::{Timestamp, VersionNumber};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub available_conditions: Json<Vec<AvailableCondition>>,
    pub condition_conflict_strategy: String,
    pub current_scheme_version: VersionNumber,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Scene {
    /// Parsed conflict strategy column.
    pub fn conflict_strategy(&self) -> Result<ConflictStrategy, CoreError> {
        self.condition_conflict_strategy.parse()
    }
}

/// A scene together with the scheme its pointer references.
#[derive(Debug, Clone, Serialize)]
pub struct SceneDetail {
    #[serde(flatten)]
    pub scene: Scene,
    pub current_scheme: SchemeVersion,
}

/// DTO for creating a scene along with its initial scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScene {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub available_conditions: Vec<AvailableCondition>,
    pub condition_conflict_strategy: Option<ConflictStrategy>,
    pub schema: serde_json::Value,
}

/// DTO for updating scene metadata. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScene {
    pub name: Option<String>,
    pub description: Option<String>,
    pub available_conditions: Option<Vec<AvailableCondition>>,
    pub condition_conflict_strategy: Option<ConflictStrategy>,
}

/// DTO for publishing a new scheme version.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScheme {
    pub schema: serde_json::Value,
    pub change_description: Option<String>,
}
