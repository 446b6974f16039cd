/// Domain error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Caller supplied a malformed argument (empty scene id, bad identity).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A schema document failed structural validity checking.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// The scene's current-version pointer refers to a version that is not
    /// in storage. This is a consistency fault, not a normal outcome.
    #[error("Scheme version {version} not found for scene {scene_id}")]
    SchemeVersionNotFound { scene_id: String, version: i32 },

    /// A uniqueness violation under concurrent writers.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the operation may succeed if re-run against fresh state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
