use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use boothline_core::error::CoreError;
use boothline_engine::QueueEngine;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::manager::WsManager;
use crate::ws::message::QueueUpdate;

/// GET /api/v1/ws -- upgrade to a queue-length observer connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, state.engine))
}

/// Manage a single observer after upgrade.
///
/// 1. Registers with `WsManager`, so no update published from here on is missed.
/// 2. Spawns a sender task draining the connection's bounded channel.
/// 3. Queues a full snapshot of every active point ahead of any later update.
/// 4. Reads inbound frames until the client goes away, then unregisters.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, engine: Arc<QueueEngine>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Observer connected");

    let mut rx = ws_manager.add(conn_id.clone()).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    let snapshot = async {
        let counts = engine.snapshot().await?;
        Ok::<_, CoreError>(
            counts
                .into_iter()
                .map(|count| QueueUpdate::from(count).to_message())
                .collect::<Vec<_>>(),
        )
    };
    match ws_manager.prime(&conn_id, snapshot).await {
        Ok(report) if report.dropped > 0 => {
            tracing::warn!(
                conn_id = %conn_id,
                dropped = report.dropped,
                "Initial snapshot exceeded observer buffer"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Initial snapshot failed");
        }
    }

    // Observers are read-only; inbound frames only signal liveness.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Observer disconnected");
}
