//! PostgreSQL-backed [`SchemeStore`].

use chamberlain_core::error::CoreError;
use chamberlain_core::scheme_version::{NewSchemeVersion, SchemeStore, SchemeVersion};
use chamberlain_core::types::VersionNumber;

use crate::error::into_core;
use crate::models::scene::{CreateScene, Scene};
use crate::repositories::{SceneRepo, SchemeVersionRepo};
use crate::DbPool;

/// Scheme version storage over the `scenes` and `scheme_versions` tables.
///
/// `create_scene` writes the scene row and its version 1 in one transaction,
/// so a scene never exists without a current scheme. `append` advances
/// `scenes.current_scheme_version` with a compare-and-set and inserts the
/// version row in one transaction. Either step losing a race rolls the whole
/// write back and reports [`CoreError::Conflict`].
#[derive(Debug, Clone)]
pub struct PgSchemeStore {
    pool: DbPool,
}

impl PgSchemeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn scene_not_found(scene_id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Scene",
        id: scene_id.to_string(),
    }
}

impl SchemeStore for PgSchemeStore {
    type NewScene = CreateScene;
    type Scene = Scene;

    async fn current_pointer(&self, scene_id: &str) -> Result<VersionNumber, CoreError> {
        SceneRepo::current_pointer(&self.pool, scene_id)
            .await
            .map_err(into_core)?
            .ok_or_else(|| scene_not_found(scene_id))
    }

    async fn find_version(
        &self,
        scene_id: &str,
        version: VersionNumber,
    ) -> Result<Option<SchemeVersion>, CoreError> {
        SchemeVersionRepo::find(&self.pool, scene_id, version)
            .await
            .map_err(into_core)?
            .map(SchemeVersion::try_from)
            .transpose()
    }

    async fn create_scene(
        &self,
        scene: &CreateScene,
        initial: NewSchemeVersion,
    ) -> Result<(Scene, SchemeVersion), CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        let stored = SceneRepo::insert(&mut tx, scene, initial.version)
            .await
            .map_err(into_core)?;
        let row = SchemeVersionRepo::insert(&mut tx, &stored.id, &initial)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        Ok((stored, row.try_into()?))
    }

    async fn append(
        &self,
        scene_id: &str,
        expected_current: VersionNumber,
        version: NewSchemeVersion,
    ) -> Result<SchemeVersion, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        if !SceneRepo::advance_pointer(&mut tx, scene_id, expected_current, version.version)
            .await
            .map_err(into_core)?
        {
            return Err(CoreError::Conflict(format!(
                "Scene {scene_id} is no longer at scheme version {expected_current}"
            )));
        }
        let row = SchemeVersionRepo::insert(&mut tx, scene_id, &version)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        row.try_into()
    }
}
