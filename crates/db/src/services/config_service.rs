//! Config document writes and lookups.
//!
//! Every write canonicalizes the condition set, derives the identity and
//! condition hash from it, and validates the payload against the targeted
//! scheme version before touching the table.

use chamberlain_core::condition::{
    canonicalize, matches_conditions, validate_conditions, Condition,
};
use chamberlain_core::error::CoreError;
use chamberlain_core::hashing::{conditions_equal, hash_conditions};
use chamberlain_core::identity::{extract_scene_id, generate_identity};
use chamberlain_core::schema::validity::validate_payload;
use chamberlain_core::scheme_version::SchemeVersion;
use chamberlain_core::types::VersionNumber;
use serde_json::Value;

use crate::error::DbResult;
use crate::models::config::{Config, ConfigFilter, ConfigRecord, CopyConfig, CreateConfig, UpdateConfig};
use crate::repositories::{ConfigRepo, SceneRepo, SchemeVersionRepo};
use crate::DbPool;

fn config_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Config",
        id: id.to_string(),
    }
}

/// Compute the stored form of a config from its raw inputs.
fn build_record(
    scene_id: &str,
    scheme_version: VersionNumber,
    conditions: &[Condition],
    config_data: Value,
) -> Result<ConfigRecord, CoreError> {
    validate_conditions(conditions)?;
    let condition_list = canonicalize(conditions);
    Ok(ConfigRecord {
        id: generate_identity(scene_id, &condition_list)?,
        scene_id: scene_id.to_string(),
        scheme_version,
        condition_hash: hash_conditions(&condition_list),
        condition_list,
        config_data,
    })
}

pub struct ConfigService;

impl ConfigService {
    /// Load a scheme version a config targets. Both the scene and the
    /// version must exist.
    async fn load_scheme(
        pool: &DbPool,
        scene_id: &str,
        version: VersionNumber,
    ) -> DbResult<SchemeVersion> {
        if !SceneRepo::exists(pool, scene_id).await? {
            return Err(CoreError::NotFound {
                entity: "Scene",
                id: scene_id.to_string(),
            }
            .into());
        }
        let row = SchemeVersionRepo::find(pool, scene_id, version)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "SchemeVersion",
                id: format!("{scene_id}@{version}"),
            })?;
        Ok(row.try_into()?)
    }

    /// Reject `record` if another config of its scene already holds the
    /// same condition set.
    async fn ensure_unoccupied(pool: &DbPool, record: &ConfigRecord) -> DbResult<()> {
        if let Some(existing) =
            ConfigRepo::find_by_hash(pool, &record.scene_id, &record.condition_hash).await?
        {
            return Err(CoreError::Conflict(format!(
                "Config '{}' already exists for these conditions",
                existing.id
            ))
            .into());
        }
        Ok(())
    }

    /// Create a config for a scene, scheme version, and condition set.
    pub async fn create(pool: &DbPool, input: CreateConfig) -> DbResult<Config> {
        let scheme = Self::load_scheme(pool, &input.scene_id, input.scheme_version).await?;
        let record = build_record(
            &input.scene_id,
            input.scheme_version,
            &input.conditions,
            input.config,
        )?;
        Self::ensure_unoccupied(pool, &record).await?;
        validate_payload(&scheme.schema_json, &record.config_data)?;

        let config = ConfigRepo::insert(pool, &record).await?;
        tracing::info!(
            config_id = %config.id,
            scene_id = %config.scene_id,
            scheme_version = config.scheme_version,
            "Config created"
        );
        Ok(config)
    }

    /// Apply a partial update.
    ///
    /// Identity and hash are recomputed from the resulting condition set, so
    /// a condition change moves the config to a new id. The resulting
    /// payload is validated against the resulting scheme version.
    pub async fn update(pool: &DbPool, id: &str, input: UpdateConfig) -> DbResult<Config> {
        let existing = Self::get(pool, id).await?;

        let scheme_version = input.scheme_version.unwrap_or(existing.scheme_version);
        let conditions = input
            .conditions
            .unwrap_or_else(|| existing.condition_list.0.clone());
        let config_data = input.config.unwrap_or(existing.config_data);

        let scheme = Self::load_scheme(pool, &existing.scene_id, scheme_version).await?;
        let record = build_record(&existing.scene_id, scheme_version, &conditions, config_data)?;
        if !conditions_equal(&existing.condition_list, &record.condition_list) {
            Self::ensure_unoccupied(pool, &record).await?;
        }
        validate_payload(&scheme.schema_json, &record.config_data)?;

        let config = ConfigRepo::replace(pool, id, &record)
            .await?
            .ok_or_else(|| config_not_found(id))?;
        tracing::info!(
            config_id = %config.id,
            previous_id = %id,
            scheme_version = config.scheme_version,
            "Config updated"
        );
        Ok(config)
    }

    /// Copy a config's payload and scheme version to another condition set
    /// of the same scene.
    pub async fn copy(pool: &DbPool, id: &str, input: CopyConfig) -> DbResult<Config> {
        let source = Self::get(pool, id).await?;
        let record = build_record(
            &source.scene_id,
            source.scheme_version,
            &input.to_conditions,
            source.config_data,
        )?;
        Self::ensure_unoccupied(pool, &record).await?;

        let config = ConfigRepo::insert(pool, &record).await?;
        tracing::info!(source_id = %id, config_id = %config.id, "Config copied");
        Ok(config)
    }

    pub async fn delete(pool: &DbPool, id: &str) -> DbResult<()> {
        extract_scene_id(id)?;
        if !ConfigRepo::delete(pool, id).await? {
            return Err(config_not_found(id).into());
        }
        tracing::info!(config_id = %id, "Config deleted");
        Ok(())
    }

    /// Load a config by identity. A malformed identity is `InvalidArgument`.
    pub async fn get(pool: &DbPool, id: &str) -> DbResult<Config> {
        extract_scene_id(id)?;
        let config = ConfigRepo::find_by_id(pool, id)
            .await?
            .ok_or_else(|| config_not_found(id))?;
        Ok(config)
    }

    /// List the configs of a scene, optionally for one scheme version.
    pub async fn list(pool: &DbPool, filter: &ConfigFilter) -> DbResult<Vec<Config>> {
        if !SceneRepo::exists(pool, &filter.scene_id).await? {
            return Err(CoreError::NotFound {
                entity: "Scene",
                id: filter.scene_id.clone(),
            }
            .into());
        }
        Ok(ConfigRepo::list(pool, filter).await?)
    }

    /// Configs of a scene whose condition set contains every pair in
    /// `query`. An empty query returns all of the scene's configs.
    pub async fn find_by_conditions(
        pool: &DbPool,
        scene_id: &str,
        query: &[Condition],
    ) -> DbResult<Vec<Config>> {
        let filter = ConfigFilter {
            scene_id: scene_id.to_string(),
            scheme_version: None,
        };
        let configs = Self::list(pool, &filter).await?;
        Ok(configs
            .into_iter()
            .filter(|config| matches_conditions(&config.condition_list, query))
            .collect())
    }
}
