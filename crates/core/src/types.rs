/// Point and ticket ids are PostgreSQL BIGSERIAL (or a monotonic counter in memory).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
