//! Repository for the `scenes` table.

use chamberlain_core::types::VersionNumber;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::scene::{CreateScene, Scene, UpdateScene};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, available_conditions, \
    condition_conflict_strategy, current_scheme_version, created_at, updated_at";

/// Provides CRUD and version-pointer operations for scenes.
pub struct SceneRepo;

impl SceneRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a new scene pointing at `initial_version`.
    ///
    /// The version row itself must be written in the same transaction.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        input: &CreateScene,
        initial_version: VersionNumber,
    ) -> Result<Scene, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes
                (id, name, description, available_conditions,
                 condition_conflict_strategy, current_scheme_version)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let strategy = input.condition_conflict_strategy.unwrap_or_default();
        sqlx::query_as::<_, Scene>(&query)
            .bind(&input.id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(Json(&input.available_conditions))
            .bind(strategy.as_str())
            .bind(initial_version)
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a scene by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether a scene with this id exists.
    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM scenes WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// List all scenes ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<Scene>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes ORDER BY id");
        sqlx::query_as::<_, Scene>(&query).fetch_all(pool).await
    }

    /// Update scene metadata. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: &str,
        input: &UpdateScene,
    ) -> Result<Option<Scene>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                available_conditions = COALESCE($4, available_conditions),
                condition_conflict_strategy = COALESCE($5, condition_conflict_strategy),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Scene>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.available_conditions.as_ref().map(Json))
            .bind(input.condition_conflict_strategy.map(|s| s.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Delete a scene. Its scheme versions and configs cascade. Returns
    /// `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM scenes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Version pointer ──────────────────────────────────────────────

    /// Read the scene's current scheme version number.
    pub async fn current_pointer(
        pool: &PgPool,
        id: &str,
    ) -> Result<Option<VersionNumber>, sqlx::Error> {
        let row: Option<(VersionNumber,)> =
            sqlx::query_as("SELECT current_scheme_version FROM scenes WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Move the pointer from `expected` to `next`. Returns `false` when the
    /// pointer no longer equals `expected` (or the scene is gone).
    ///
    /// The row lock taken here serializes concurrent appends for a scene.
    pub async fn advance_pointer(
        tx: &mut Transaction<'_, Postgres>,
        id: &str,
        expected: VersionNumber,
        next: VersionNumber,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scenes SET current_scheme_version = $3, updated_at = NOW() \
             WHERE id = $1 AND current_scheme_version = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
