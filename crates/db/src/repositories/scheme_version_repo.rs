//! Repository for the `scheme_versions` table.

use chamberlain_core::scheme_version::NewSchemeVersion;
use chamberlain_core::types::VersionNumber;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::scheme_version::SchemeVersionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, scene_id, version, schema_json, status, \
    change_description, is_breaking_change, created_at";

/// Versions are append-only; there is no update or delete.
pub struct SchemeVersionRepo;

impl SchemeVersionRepo {
    /// Insert a planned version for a scene.
    ///
    /// A taken `(scene_id, version)` pair fails with a unique violation on
    /// `uq_scheme_versions_scene_version`.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        scene_id: &str,
        input: &NewSchemeVersion,
    ) -> Result<SchemeVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO scheme_versions
                (scene_id, version, schema_json, status, change_description, is_breaking_change)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SchemeVersionRow>(&query)
            .bind(scene_id)
            .bind(input.version)
            .bind(&input.schema_json)
            .bind(input.status.as_str())
            .bind(&input.change_description)
            .bind(input.is_breaking_change)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find one version of a scene.
    pub async fn find(
        pool: &PgPool,
        scene_id: &str,
        version: VersionNumber,
    ) -> Result<Option<SchemeVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scheme_versions WHERE scene_id = $1 AND version = $2"
        );
        sqlx::query_as::<_, SchemeVersionRow>(&query)
            .bind(scene_id)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// List all versions of a scene, newest first.
    pub async fn list_by_scene(
        pool: &PgPool,
        scene_id: &str,
    ) -> Result<Vec<SchemeVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scheme_versions WHERE scene_id = $1 ORDER BY version DESC"
        );
        sqlx::query_as::<_, SchemeVersionRow>(&query)
            .bind(scene_id)
            .fetch_all(pool)
            .await
    }
}
