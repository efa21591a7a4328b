//! Boothline admission engine.
//!
//! [`QueueEngine`] is the single entry point collaborators call: it enforces
//! point activity, per-visitor limits and queue capacity under a per-user /
//! per-point lock discipline, mutates the [`QueueStore`] and publishes the
//! resulting queue lengths on the event bus.
//!
//! [`MemoryStore`] is a complete in-process [`QueueStore`] used when no
//! database is configured and throughout the tests.
//!
//! [`QueueStore`]: boothline_core::store::QueueStore

pub mod engine;
pub mod locks;
pub mod memory;
pub mod seed;
pub mod views;

pub use engine::QueueEngine;
pub use memory::MemoryStore;
pub use views::{JoinOutcome, JoinReceipt, LeaveOutcome, LeaveTarget, PointCount, PointSummary, UserTicket};
