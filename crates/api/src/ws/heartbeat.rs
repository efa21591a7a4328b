use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that pings every observer periodically.
///
/// Closed connections are pruned as a side effect. Runs until `cancel`
/// is triggered.
pub fn start_heartbeat(
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Heartbeat stopping");
                    break;
                }
                _ = interval.tick() => {
                    let report = ws_manager.ping_all().await;
                    tracing::debug!(
                        delivered = report.delivered,
                        closed = report.closed,
                        "WebSocket heartbeat ping"
                    );
                }
            }
        }
    })
}
