//! Scheme version lifecycle.
//!
//! Every schema change produces a new immutable [`SchemeVersion`] numbered
//! `current + 1`; the scene's pointer then moves to it. Older versions keep
//! their status so configs authored against them stay addressable.
//!
//! Persistence goes through [`SchemeStore`]. The store owns atomicity: a
//! scene is registered together with its version 1, and
//! [`SchemeStore::append`] inserts the row and advances the pointer as one
//! unit. Lost races are reported as [`CoreError::Conflict`].

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::schema::compat::{diff_schemas, is_breaking_change};
use crate::schema::validity::{check_schema, is_valid_schema};
use crate::types::{DbId, Timestamp, VersionNumber};

/// Version number assigned to a scene's first scheme.
pub const INITIAL_VERSION: VersionNumber = 1;

/// Change description recorded on the first version.
pub const INITIAL_CHANGE_DESCRIPTION: &str = "Initial version";

/// Warning returned by [`SchemeLifecycle::validate_candidate`] for a
/// structurally invalid candidate.
pub const INVALID_SCHEMA_WARNING: &str = "schema invalid";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a scheme version.
///
/// Versions are created `Active`. `Draft` and `Deprecated` are declared for
/// future workflows; nothing transitions into them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeStatus {
    Draft,
    Active,
    Deprecated,
}

impl SchemeStatus {
    /// String representation for display, logging, and database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Deprecated => "deprecated",
        }
    }
}

impl std::str::FromStr for SchemeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "deprecated" => Ok(Self::Deprecated),
            other => Err(CoreError::Internal(format!(
                "Unknown scheme status '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for SchemeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted, immutable scheme snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeVersion {
    pub id: DbId,
    pub scene_id: String,
    pub version: VersionNumber,
    pub schema_json: Value,
    pub status: SchemeStatus,
    pub change_description: Option<String>,
    pub is_breaking_change: bool,
    pub created_at: Timestamp,
}

/// A scheme version ready to be written. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchemeVersion {
    pub version: VersionNumber,
    pub schema_json: Value,
    pub status: SchemeStatus,
    pub change_description: Option<String>,
    pub is_breaking_change: bool,
}

/// Read-only preview of a candidate scheme against the current version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReport {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub is_breaking_change: bool,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Build version 1 for a new scene. Fails with `InvalidSchema` when the
/// schema is structurally invalid.
pub fn plan_initial_version(schema: Value) -> Result<NewSchemeVersion, CoreError> {
    check_schema(&schema)?;
    Ok(NewSchemeVersion {
        version: INITIAL_VERSION,
        schema_json: schema,
        status: SchemeStatus::Active,
        change_description: Some(INITIAL_CHANGE_DESCRIPTION.to_string()),
        is_breaking_change: false,
    })
}

/// Build the successor of `current`. The schema must already have passed
/// [`check_schema`].
pub fn plan_next_version(
    current: &SchemeVersion,
    new_schema: Value,
    change_description: Option<String>,
) -> NewSchemeVersion {
    let breaking = is_breaking_change(&current.schema_json, &new_schema);
    NewSchemeVersion {
        version: current.version + 1,
        schema_json: new_schema,
        status: SchemeStatus::Active,
        change_description,
        is_breaking_change: breaking,
    }
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Persistence operations the lifecycle needs.
pub trait SchemeStore: Send + Sync {
    /// Scene data registered together with its first version.
    type NewScene: Send + Sync;

    /// The stored scene as returned by [`SchemeStore::create_scene`].
    type Scene: Send;

    /// The scene's current version pointer. `NotFound` if the scene does not
    /// exist.
    fn current_pointer(
        &self,
        scene_id: &str,
    ) -> impl Future<Output = Result<VersionNumber, CoreError>> + Send;

    /// Look up one version of a scene.
    fn find_version(
        &self,
        scene_id: &str,
        version: VersionNumber,
    ) -> impl Future<Output = Result<Option<SchemeVersion>, CoreError>> + Send;

    /// Write a new scene pointing at `initial` and the version row itself as
    /// one unit. `Conflict` if the scene already exists.
    fn create_scene(
        &self,
        scene: &Self::NewScene,
        initial: NewSchemeVersion,
    ) -> impl Future<Output = Result<(Self::Scene, SchemeVersion), CoreError>> + Send;

    /// Atomically write `version` and move the pointer from
    /// `expected_current` to `version.version`. `Conflict` if the pointer
    /// has moved or the number is taken.
    fn append(
        &self,
        scene_id: &str,
        expected_current: VersionNumber,
        version: NewSchemeVersion,
    ) -> impl Future<Output = Result<SchemeVersion, CoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Lifecycle manager
// ---------------------------------------------------------------------------

/// Creates and previews scheme versions against a [`SchemeStore`].
#[derive(Debug, Clone)]
pub struct SchemeLifecycle<S> {
    store: S,
}

impl<S: SchemeStore> SchemeLifecycle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the version the scene's pointer references.
    pub async fn current_version(&self, scene_id: &str) -> Result<SchemeVersion, CoreError> {
        let pointer = self.store.current_pointer(scene_id).await?;
        self.store
            .find_version(scene_id, pointer)
            .await?
            .ok_or_else(|| CoreError::SchemeVersionNotFound {
                scene_id: scene_id.to_string(),
                version: pointer,
            })
    }

    /// Register `scene` with `schema` as its version 1.
    ///
    /// The schema is checked before anything is written.
    pub async fn create_initial_version(
        &self,
        scene: &S::NewScene,
        schema: Value,
    ) -> Result<(S::Scene, SchemeVersion), CoreError> {
        let planned = plan_initial_version(schema)?;
        let (stored, created) = self.store.create_scene(scene, planned).await?;
        tracing::info!(
            scene_id = %created.scene_id,
            version = created.version,
            "Created initial scheme version"
        );
        Ok((stored, created))
    }

    /// Create `current + 1` from `new_schema` and advance the pointer.
    ///
    /// A lost race is retried once against freshly read state; a second
    /// `Conflict` is returned to the caller.
    pub async fn create_new_version(
        &self,
        scene_id: &str,
        new_schema: Value,
        change_description: Option<String>,
    ) -> Result<SchemeVersion, CoreError> {
        check_schema(&new_schema)?;

        let first = self
            .append_next(scene_id, new_schema.clone(), change_description.clone())
            .await;
        let created = match first {
            Err(err) if err.is_retryable() => {
                tracing::warn!(scene_id = %scene_id, error = %err, "Scheme version conflict, retrying once");
                self.append_next(scene_id, new_schema, change_description)
                    .await?
            }
            other => other?,
        };

        tracing::info!(
            scene_id = %scene_id,
            version = created.version,
            is_breaking = created.is_breaking_change,
            "Created new scheme version"
        );
        Ok(created)
    }

    async fn append_next(
        &self,
        scene_id: &str,
        new_schema: Value,
        change_description: Option<String>,
    ) -> Result<SchemeVersion, CoreError> {
        let current = self.current_version(scene_id).await?;
        let planned = plan_next_version(&current, new_schema, change_description);
        self.store.append(scene_id, current.version, planned).await
    }

    /// Preview `candidate` against the current version without writing.
    ///
    /// The scene must exist. A structurally invalid candidate then yields an
    /// invalid report rather than an error, and is not compared.
    pub async fn validate_candidate(
        &self,
        scene_id: &str,
        candidate: &Value,
    ) -> Result<CandidateReport, CoreError> {
        self.store.current_pointer(scene_id).await?;

        if !is_valid_schema(candidate) {
            return Ok(CandidateReport {
                valid: false,
                warnings: vec![INVALID_SCHEMA_WARNING.to_string()],
                is_breaking_change: false,
            });
        }

        let current = self.current_version(scene_id).await?;
        Ok(CandidateReport {
            valid: true,
            warnings: diff_schemas(&current.schema_json, candidate),
            is_breaking_change: is_breaking_change(&current.schema_json, candidate),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
