//! Storage contracts for the queue engine.
//!
//! Three traits mirror the three stateful components: the point registry,
//! the ticket store and the settings row. [`QueueStore`] is the union a
//! backend has to provide. Implementations live in `boothline-engine`
//! (in memory) and `boothline-db` (PostgreSQL).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::point::{Point, PointSpec};
use crate::settings::Settings;
use crate::ticket::Ticket;
use crate::types::DbId;

/// Result alias for storage calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of [`TicketStore::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new active ticket was created at `position` in a queue that now
    /// holds `queued` tickets.
    Inserted {
        ticket: Ticket,
        position: u32,
        queued: u32,
    },
    /// The visitor already holds an active ticket at this point.
    AlreadyActive(Ticket),
    /// The point is missing or closed.
    PointClosed,
    /// The visitor already holds `limit` active tickets.
    LimitReached { limit: u32 },
    /// The point's queue is at its `max_queue`.
    QueueFull { max_queue: u32 },
}

/// A ticket that just left the active state, with the length of its
/// point's queue right after the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub ticket: Ticket,
    pub queued: u32,
}

/// Outcome of [`PointRegistry::delete_point`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Tickets still reference the point; nothing was removed.
    Referenced { tickets: u64 },
}

#[async_trait]
pub trait PointRegistry: Send + Sync {
    async fn get_point(&self, id: DbId) -> StoreResult<Option<Point>>;

    /// Points in ascending id order. Inactive points are included only when
    /// `include_inactive` is set.
    async fn list_points(&self, include_inactive: bool) -> StoreResult<Vec<Point>>;

    async fn create_point(&self, spec: &PointSpec) -> StoreResult<Point>;

    /// Replace a point's attributes. `spec.is_active == None` keeps the flag.
    async fn update_point(&self, id: DbId, spec: &PointSpec) -> StoreResult<Option<Point>>;

    async fn set_point_active(&self, id: DbId, is_active: bool) -> StoreResult<Option<Point>>;

    /// Remove a point that no ticket references.
    async fn delete_point(&self, id: DbId) -> StoreResult<DeleteOutcome>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Active tickets of a point, in queue order.
    async fn active_tickets_for_point(&self, point_id: DbId) -> StoreResult<Vec<Ticket>>;

    /// Active tickets of a visitor across all points, in creation order.
    async fn active_tickets_for_user(&self, user_id: &str) -> StoreResult<Vec<Ticket>>;

    async fn find_active(&self, user_id: &str, point_id: DbId) -> StoreResult<Option<Ticket>>;

    async fn find_ticket(&self, ticket_id: DbId) -> StoreResult<Option<Ticket>>;

    /// Number of active tickets per point. Points without tickets may be absent.
    async fn active_counts(&self) -> StoreResult<HashMap<DbId, u32>>;

    /// Create an active ticket with the next id and the current time.
    ///
    /// In one atomic step: re-reads the point's `is_active` and
    /// `max_queue`, the visitor's existing tickets against the stored
    /// `active_limit`, inserts, and reports the new ticket's position and
    /// the resulting queue length. Nothing is written unless the outcome is
    /// [`InsertOutcome::Inserted`].
    async fn insert(&self, user_id: &str, point_id: DbId) -> StoreResult<InsertOutcome>;

    /// Move an active ticket owned by `user_id` to `Canceled`.
    ///
    /// Returns `None` when the ticket does not exist, belongs to someone
    /// else, or is no longer active.
    async fn cancel(&self, ticket_id: DbId, user_id: &str) -> StoreResult<Option<Transition>>;

    /// Mark the head of a point's queue as `Served`.
    async fn serve_next(&self, point_id: DbId) -> StoreResult<Option<Transition>>;

    /// Mark a specific active ticket as `Served`.
    async fn mark_served(&self, ticket_id: DbId) -> StoreResult<Option<Transition>>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self) -> StoreResult<Settings>;

    /// Replace the stored settings.
    async fn save_settings(&self, settings: &Settings) -> StoreResult<()>;
}

/// Everything the engine needs from a storage backend.
pub trait QueueStore: PointRegistry + TicketStore + SettingsStore {}

impl<T: PointRegistry + TicketStore + SettingsStore> QueueStore for T {}
