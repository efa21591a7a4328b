use crate::types::DbId;

/// Failure reported by a storage backend.
///
/// Backends classify their own errors: `Transient` failures may be retried
/// by the backend itself before surfacing, `Backend` failures never are.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Point {point_id} is not accepting visitors")]
    InactivePoint { point_id: DbId },

    #[error("Queue for point {point_id} is full ({max_queue} visitors)")]
    QueueFull { point_id: DbId, max_queue: u32 },

    #[error("Active ticket limit reached ({limit} per visitor)")]
    LimitExceeded { limit: u32 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
