//! Bus-to-observer fan-out.
//!
//! [`ObserverFanout`] subscribes to the queue event bus and offers every
//! update to all WebSocket observers. Mutating requests only publish to the
//! bus, so they never wait on an observer.

use std::sync::Arc;

use boothline_engine::QueueEngine;
use boothline_events::QueueEvent;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::{QueueUpdate, WsManager};

/// Forwards queue events to WebSocket observers.
pub struct ObserverFanout {
    engine: Arc<QueueEngine>,
    ws_manager: Arc<WsManager>,
}

impl ObserverFanout {
    pub fn new(engine: Arc<QueueEngine>, ws_manager: Arc<WsManager>) -> Self {
        Self { engine, ws_manager }
    }

    /// Run the forwarding loop until `cancel` fires or the bus closes.
    ///
    /// When the loop falls behind the bus it skips the lost events and
    /// pushes a fresh snapshot instead, so observers still converge.
    pub async fn run(self, mut receiver: broadcast::Receiver<QueueEvent>, cancel: CancellationToken) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Observer fan-out stopping");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => {
                    let report = self
                        .ws_manager
                        .broadcast(QueueUpdate::from(&event).to_message())
                        .await;
                    tracing::trace!(
                        point_id = event.point_id,
                        queued_count = event.queued_count,
                        delivered = report.delivered,
                        dropped = report.dropped,
                        "Fanned out queue update"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Observer fan-out lagged, resyncing");
                    self.resync().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, observer fan-out shutting down");
                    break;
                }
            }
        }
    }

    async fn resync(&self) {
        match self.engine.snapshot().await {
            Ok(counts) => {
                for count in counts {
                    self.ws_manager
                        .broadcast(QueueUpdate::from(count).to_message())
                        .await;
                }
            }
            Err(e) => tracing::error!(error = %e, "Snapshot for resync failed"),
        }
    }
}
