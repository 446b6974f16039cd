//! Scheme version row model.

use chamberlain_core::error::CoreError;
use chamberlain_core::scheme_version::SchemeVersion;
use chamberlain_core::types::{DbId, Timestamp, VersionNumber};
use sqlx::FromRow;

/// A row from the `scheme_versions` table.
///
/// Converted to the domain [`SchemeVersion`] before leaving the crate.
#[derive(Debug, Clone, FromRow)]
pub struct SchemeVersionRow {
    pub id: DbId,
    pub scene_id: String,
    pub version: VersionNumber,
    pub schema_json: serde_json::Value,
    pub status: String,
    pub change_description: Option<String>,
    pub is_breaking_change: bool,
    pub created_at: Timestamp,
}

impl TryFrom<SchemeVersionRow> for SchemeVersion {
    type Error = CoreError;

    fn try_from(row: SchemeVersionRow) -> Result<Self, Self::Error> {
        Ok(SchemeVersion {
            id: row.id,
            scene_id: row.scene_id,
            version: row.version,
            schema_json: row.schema_json,
            status: row.status.parse()?,
            change_description: row.change_description,
            is_breaking_change: row.is_breaking_change,
            created_at: row.created_at,
        })
    }
}
