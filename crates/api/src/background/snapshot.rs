//! Periodic full snapshot of queue lengths.
//!
//! Publishes the count of every active point on the event bus at a fixed
//! interval, so observers that dropped updates (full buffer, lag)
//! converge without reconnecting.

use std::sync::Arc;
use std::time::Duration;

use boothline_engine::QueueEngine;
use tokio_util::sync::CancellationToken;

/// Run the snapshot loop every `interval` until `cancel` is triggered.
pub async fn run(engine: Arc<QueueEngine>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Snapshot job started");

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; observers already get a
    // snapshot on connect.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Snapshot job stopping");
                break;
            }
            _ = ticker.tick() => {
                match engine.publish_snapshot().await {
                    Ok(points) => tracing::debug!(points, "Published queue snapshot"),
                    Err(e) => tracing::error!(error = %e, "Queue snapshot failed"),
                }
            }
        }
    }
}
