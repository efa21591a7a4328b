//! Boothline change notification.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. Publishing never blocks; subscribers that
//!   fall behind lose the oldest events and resync from a snapshot.
//! - [`QueueEvent`] is the queue-length delta published after every
//!   admission, withdrawal or service.

pub mod bus;

pub use bus::{EventBus, QueueChange, QueueEvent};
