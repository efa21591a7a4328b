//! Retry of transient database failures with exponential backoff.
//!
//! Serialization failures, deadlocks and pool exhaustion are worth another
//! try: the whole operation (including any transaction) is rerun after a
//! short delay. Everything else surfaces immediately.

use std::future::Future;
use std::time::Duration;

use boothline_core::error::StoreError;

/// Backoff before each retry (exponential: 25 ms, 50 ms, 100 ms).
const RETRY_DELAYS_MS: [u64; 3] = [25, 50, 100];

/// SQLSTATE codes that indicate a retryable conflict.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Whether a failed operation may succeed if simply rerun.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
        ),
        _ => false,
    }
}

/// Map a database error onto the storage error taxonomy.
pub fn classify(err: sqlx::Error) -> StoreError {
    if is_transient(&err) {
        StoreError::Transient(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

/// Run `op`, retrying transient failures up to three times.
///
/// `op` is called afresh for every attempt so each retry starts a new
/// transaction.
pub async fn with_retry<T, F, Fut>(operation: &'static str, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) => {
                tracing::warn!(
                    operation,
                    attempt = attempt + 1,
                    error = %e,
                    "Transient database failure, retrying"
                );
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
            Err(e) => return Err(classify(e)),
        }
    }

    // Final attempt after the last backoff.
    op().await.map_err(|e| {
        tracing::error!(operation, error = %e, "Database operation failed after retries");
        classify(e)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(sqlx::Error::PoolTimedOut)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_four_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::PoolTimedOut) }
        })
        .await;

        assert_matches!(result, Err(StoreError::Transient(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(sqlx::Error::RowNotFound) }
        })
        .await;

        assert_matches!(result, Err(StoreError::Backend(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
