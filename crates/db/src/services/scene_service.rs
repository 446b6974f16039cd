//! Scene registration and scheme evolution.

use chamberlain_core::error::CoreError;
use chamberlain_core::scene::{
    validate_available_conditions, validate_scene_id, validate_scene_name,
};
use chamberlain_core::scheme_version::{CandidateReport, SchemeLifecycle, SchemeVersion};
use serde_json::Value;

use crate::error::DbResult;
use crate::models::scene::{CreateScene, Scene, SceneDetail, UpdateScene, UpdateScheme};
use crate::repositories::{SceneRepo, SchemeVersionRepo};
use crate::store::PgSchemeStore;
use crate::DbPool;

fn scene_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Scene",
        id: id.to_string(),
    }
}

pub struct SceneService;

impl SceneService {
    fn lifecycle(pool: &DbPool) -> SchemeLifecycle<PgSchemeStore> {
        SchemeLifecycle::new(PgSchemeStore::new(pool.clone()))
    }

    /// Register a scene together with scheme version 1.
    ///
    /// The scene row and its first version commit in one transaction, so a
    /// scene never exists without a current scheme.
    pub async fn create(pool: &DbPool, input: &CreateScene) -> DbResult<SceneDetail> {
        validate_scene_id(&input.id)?;
        validate_scene_name(&input.name)?;
        validate_available_conditions(&input.available_conditions)?;

        if SceneRepo::exists(pool, &input.id).await? {
            return Err(CoreError::Conflict(format!("Scene '{}' already exists", input.id)).into());
        }

        let (scene, current_scheme) = Self::lifecycle(pool)
            .create_initial_version(input, input.schema.clone())
            .await?;
        tracing::info!(scene_id = %scene.id, "Scene created");
        Ok(SceneDetail {
            scene,
            current_scheme,
        })
    }

    /// Load a scene and the scheme version its pointer references.
    pub async fn get(pool: &DbPool, id: &str) -> DbResult<SceneDetail> {
        let scene = SceneRepo::find_by_id(pool, id)
            .await?
            .ok_or_else(|| scene_not_found(id))?;
        let version = SchemeVersionRepo::find(pool, id, scene.current_scheme_version)
            .await?
            .ok_or_else(|| CoreError::SchemeVersionNotFound {
                scene_id: id.to_string(),
                version: scene.current_scheme_version,
            })?;
        Ok(SceneDetail {
            scene,
            current_scheme: version.try_into()?,
        })
    }

    pub async fn list(pool: &DbPool) -> DbResult<Vec<Scene>> {
        Ok(SceneRepo::list(pool).await?)
    }

    /// Update scene metadata. The scheme is changed only through
    /// [`SceneService::update_scheme`].
    pub async fn update(pool: &DbPool, id: &str, input: &UpdateScene) -> DbResult<Scene> {
        if let Some(name) = &input.name {
            validate_scene_name(name)?;
        }
        if let Some(catalog) = &input.available_conditions {
            validate_available_conditions(catalog)?;
        }

        let scene = SceneRepo::update(pool, id, input)
            .await?
            .ok_or_else(|| scene_not_found(id))?;
        tracing::info!(scene_id = %id, "Scene updated");
        Ok(scene)
    }

    /// Delete a scene along with its scheme versions and configs.
    pub async fn delete(pool: &DbPool, id: &str) -> DbResult<()> {
        if !SceneRepo::delete(pool, id).await? {
            return Err(scene_not_found(id).into());
        }
        tracing::info!(scene_id = %id, "Scene deleted");
        Ok(())
    }

    // ── Scheme versions ──────────────────────────────────────────────

    /// Publish a new scheme version and move the scene to it.
    pub async fn update_scheme(
        pool: &DbPool,
        id: &str,
        input: UpdateScheme,
    ) -> DbResult<SchemeVersion> {
        let version = Self::lifecycle(pool)
            .create_new_version(id, input.schema, input.change_description)
            .await?;
        Ok(version)
    }

    /// Preview a candidate scheme against the current version.
    pub async fn validate_scheme(
        pool: &DbPool,
        id: &str,
        candidate: &Value,
    ) -> DbResult<CandidateReport> {
        Ok(Self::lifecycle(pool).validate_candidate(id, candidate).await?)
    }

    /// All scheme versions of a scene, newest first.
    pub async fn scheme_versions(pool: &DbPool, id: &str) -> DbResult<Vec<SchemeVersion>> {
        if !SceneRepo::exists(pool, id).await? {
            return Err(scene_not_found(id).into());
        }
        let rows = SchemeVersionRepo::list_by_scene(pool, id).await?;
        let versions = rows
            .into_iter()
            .map(SchemeVersion::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(versions)
    }
}
