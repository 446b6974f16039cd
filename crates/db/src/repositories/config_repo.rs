//! Repository for the `configs` table.

use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::config::{Config, ConfigFilter, ConfigRecord};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, scene_id, scheme_version, condition_list, \
    condition_hash, config_data, created_at, updated_at";

/// Provides CRUD operations for config documents.
///
/// Rows are written from a fully computed [`ConfigRecord`]; identity and
/// hash derivation belong to the service layer.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Insert a config document.
    ///
    /// An occupied identity or `(scene_id, condition_hash)` pair fails with a
    /// unique violation.
    pub async fn insert(pool: &PgPool, record: &ConfigRecord) -> Result<Config, sqlx::Error> {
        let query = format!(
            "INSERT INTO configs
                (id, scene_id, scheme_version, condition_list, condition_hash, config_data)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Config>(&query)
            .bind(&record.id)
            .bind(&record.scene_id)
            .bind(record.scheme_version)
            .bind(Json(&record.condition_list))
            .bind(&record.condition_hash)
            .bind(&record.config_data)
            .fetch_one(pool)
            .await
    }

    /// Find a config by its identity.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Config>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM configs WHERE id = $1");
        sqlx::query_as::<_, Config>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the config of a scene stored under a condition hash.
    pub async fn find_by_hash(
        pool: &PgPool,
        scene_id: &str,
        condition_hash: &str,
    ) -> Result<Option<Config>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configs WHERE scene_id = $1 AND condition_hash = $2"
        );
        sqlx::query_as::<_, Config>(&query)
            .bind(scene_id)
            .bind(condition_hash)
            .fetch_optional(pool)
            .await
    }

    /// List a scene's configs, optionally restricted to one scheme version,
    /// ordered by identity.
    pub async fn list(pool: &PgPool, filter: &ConfigFilter) -> Result<Vec<Config>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configs
             WHERE scene_id = $1
               AND ($2::INTEGER IS NULL OR scheme_version = $2)
             ORDER BY id"
        );
        sqlx::query_as::<_, Config>(&query)
            .bind(&filter.scene_id)
            .bind(filter.scheme_version)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the config stored under `id` with `record`.
    ///
    /// `record.id` may differ from `id` when the condition set changed; the
    /// row then moves to its new identity. Returns `None` if `id` does not
    /// exist.
    pub async fn replace(
        pool: &PgPool,
        id: &str,
        record: &ConfigRecord,
    ) -> Result<Option<Config>, sqlx::Error> {
        let query = format!(
            "UPDATE configs SET
                id = $2,
                scheme_version = $3,
                condition_list = $4,
                condition_hash = $5,
                config_data = $6,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Config>(&query)
            .bind(id)
            .bind(&record.id)
            .bind(record.scheme_version)
            .bind(Json(&record.condition_list))
            .bind(&record.condition_hash)
            .bind(&record.config_data)
            .fetch_optional(pool)
            .await
    }

    /// Delete a config by identity. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM configs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
