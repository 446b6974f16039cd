use chamberlain_core::error::CoreError;

/// Error type for repositories and services.
///
/// Unique-constraint violations never surface as [`DbError::Database`]; they
/// are converted to [`CoreError::Conflict`] so callers can retry them.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

/// Convenience alias for service return values.
pub type DbResult<T> = Result<T, DbError>;

/// PostgreSQL `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match conflict_message(&err) {
            Some(msg) => Self::Core(CoreError::Conflict(msg)),
            None => Self::Database(err),
        }
    }
}

impl DbError {
    /// The wrapped domain error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core) => Some(core),
            Self::Database(_) => None,
        }
    }
}

/// Describe a unique violation, or `None` for any other error.
fn conflict_message(err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some(UNIQUE_VIOLATION) {
        return None;
    }
    let constraint = db_err.constraint().unwrap_or("unknown");
    Some(format!(
        "Duplicate value violates unique constraint: {constraint}"
    ))
}

/// Map a sqlx error onto the core taxonomy for the [`SchemeStore`] seam.
///
/// [`SchemeStore`]: chamberlain_core::scheme_version::SchemeStore
pub(crate) fn into_core(err: sqlx::Error) -> CoreError {
    match conflict_message(&err) {
        Some(msg) => CoreError::Conflict(msg),
        None => {
            tracing::error!(error = %err, "Database error");
            CoreError::Internal(format!("Database error: {err}"))
        }
    }
}
