use std::collections::HashMap;
use std::future::Future;

use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Default capacity of each observer's outbound channel.
pub const DEFAULT_OBSERVER_BUFFER: usize = 64;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::Sender<Message>;

/// Per-call delivery counts from [`WsManager::broadcast`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Observers whose buffer was full; they miss this message only.
    pub dropped: usize,
    /// Observers whose receiver was gone; they have been removed.
    pub closed: usize,
}

/// Registry of WebSocket observers.
///
/// Each observer owns a bounded channel. Broadcasting never waits on a
/// slow observer: a full buffer drops the message for that observer and
/// a closed channel unregisters it. Thread-safe via interior `RwLock`;
/// wrap in `Arc` to share.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsSender>>,
    buffer: usize,
}

impl WsManager {
    /// Create an empty registry whose observers buffer `buffer` messages.
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.connections.write().await.insert(conn_id, tx);
        rx
    }

    /// Remove a connection by its ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Queue a connection's initial messages ahead of any later broadcast.
    ///
    /// `load` runs while the registry is locked for writing, so no
    /// broadcast can interleave between reading the state and queueing it:
    /// every update the connection receives afterwards was fanned out after
    /// `load` read its state. Messages that do not fit the buffer are
    /// dropped like any other update.
    pub async fn prime<Fut, E>(&self, conn_id: &str, load: Fut) -> Result<BroadcastReport, E>
    where
        Fut: Future<Output = Result<Vec<Message>, E>>,
    {
        let conns = self.connections.write().await;
        let messages = load.await?;

        let mut report = BroadcastReport::default();
        let Some(sender) = conns.get(conn_id) else {
            return Ok(report);
        };
        for message in messages {
            match sender.try_send(message) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => report.dropped += 1,
                Err(TrySendError::Closed(_)) => {
                    report.closed = 1;
                    break;
                }
            }
        }
        Ok(report)
    }

    /// Offer a message to every observer without blocking.
    pub async fn broadcast(&self, message: Message) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut gone = Vec::new();

        {
            let conns = self.connections.read().await;
            for (conn_id, sender) in conns.iter() {
                match sender.try_send(message.clone()) {
                    Ok(()) => report.delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        report.dropped += 1;
                        tracing::debug!(conn_id = %conn_id, "Observer buffer full, dropping update");
                    }
                    Err(TrySendError::Closed(_)) => gone.push(conn_id.clone()),
                }
            }
        }

        if !gone.is_empty() {
            let mut conns = self.connections.write().await;
            for conn_id in &gone {
                conns.remove(conn_id);
            }
            report.closed = gone.len();
            tracing::debug!(count = gone.len(), "Removed closed observers");
        }

        report
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for sender in conns.values() {
            let _ = sender.try_send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) -> BroadcastReport {
        self.broadcast(Message::Ping(Bytes::new())).await
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new(DEFAULT_OBSERVER_BUFFER)
    }
}
