//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`QueueEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use boothline_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// QueueEvent
// ---------------------------------------------------------------------------

/// What caused a queue length to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueChange {
    Joined,
    Left,
    Served,
    /// Point attributes changed (capacity, active flag).
    PointUpdated,
    /// Periodic resync; nothing necessarily changed.
    Snapshot,
}

/// The new active-ticket count of one point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
    pub point_id: DbId,
    pub queued_count: u32,
    pub change: QueueChange,
    pub timestamp: Timestamp,
}

impl QueueEvent {
    pub fn new(point_id: DbId, queued_count: u32, change: QueueChange) -> Self {
        Self {
            point_id,
            queued_count,
            change,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`QueueEvent`].
///
/// # Usage
///
/// ```rust
/// use boothline_events::bus::{EventBus, QueueChange, QueueEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(QueueEvent::new(1, 3, QueueChange::Joined));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Never blocks. If there are no active subscribers the event is dropped.
    pub fn publish(&self, event: QueueEvent) {
        tracing::trace!(
            point_id = event.point_id,
            queued_count = event.queued_count,
            change = ?event.change,
            "Publishing queue event"
        );
        // Ignore the SendError, it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
