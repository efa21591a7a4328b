use std::sync::Arc;

use boothline_engine::QueueEngine;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Queue engine: admission, withdrawal, point administration.
    pub engine: Arc<QueueEngine>,
    /// WebSocket observer registry.
    pub ws_manager: Arc<WsManager>,
    /// Cancelled when shutdown starts; ends long-lived observer streams.
    pub shutdown: CancellationToken,
}
