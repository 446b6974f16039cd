/// Surrogate primary keys (scheme version rows) are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Scheme version numbers are 1-based and stored as INTEGER.
pub type VersionNumber = i32;
