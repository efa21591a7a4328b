//! WebSocket infrastructure for queue observers.
//!
//! Provides the observer registry, heartbeat, wire format, and the HTTP
//! upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;
pub mod message;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::{BroadcastReport, WsManager};
pub use message::QueueUpdate;
