//! Wire format pushed to observers.

use axum::extract::ws::Message;
use boothline_core::types::DbId;
use boothline_engine::PointCount;
use boothline_events::QueueEvent;
use serde::Serialize;

/// `{ "point_id": .., "queued_count": .. }`, sent over WebSocket text
/// frames and as SSE `update` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueUpdate {
    pub point_id: DbId,
    pub queued_count: u32,
}

impl QueueUpdate {
    pub fn to_message(self) -> Message {
        // Serializing two integers cannot fail.
        let json = serde_json::to_string(&self).unwrap_or_default();
        Message::Text(json.into())
    }
}

impl From<&QueueEvent> for QueueUpdate {
    fn from(event: &QueueEvent) -> Self {
        Self {
            point_id: event.point_id,
            queued_count: event.queued_count,
        }
    }
}

impl From<PointCount> for QueueUpdate {
    fn from(count: PointCount) -> Self {
        Self {
            point_id: count.point_id,
            queued_count: count.queued_count,
        }
    }
}
