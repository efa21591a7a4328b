use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use boothline_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `boothline_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error to an HTTP status, error code, and client-facing message.
///
/// Admission refusals are all `409 Conflict` with distinct codes so clients
/// can tell a full queue from a closed point or an exhausted limit.
/// Storage failures are logged in full but reported without detail.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::QueueFull { .. } => (StatusCode::CONFLICT, "QUEUE_FULL", err.to_string()),
        CoreError::LimitExceeded { .. } => {
            (StatusCode::CONFLICT, "LIMIT_EXCEEDED", err.to_string())
        }
        CoreError::InactivePoint { .. } => {
            (StatusCode::CONFLICT, "POINT_INACTIVE", err.to_string())
        }
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Storage(store_err) => {
            tracing::error!(error = %store_err, "Storage failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_UNAVAILABLE",
                "Storage is temporarily unavailable, please retry".to_string(),
            )
        }
    }
}
