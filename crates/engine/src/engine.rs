//! The admission controller.
//!
//! Every mutation follows the same discipline: take the visitor's lock,
//! then the point's lock (always in that order), check, mutate the store,
//! publish, release. Events for one point are therefore published in the
//! order their changes were committed. The store reports the queue length
//! from the same atomic step as the change, so nothing is read back after
//! a commit, and its `insert` re-checks activity, limit and capacity
//! itself.

use std::collections::HashMap;
use std::sync::Arc;

use boothline_core::error::CoreError;
use boothline_core::eta::{eta_minutes, estimate};
use boothline_core::point::{Point, PointInput};
use boothline_core::settings::{Settings, SettingsPatch};
use boothline_core::store::{DeleteOutcome, InsertOutcome, QueueStore, Transition};
use boothline_core::ticket::{normalize_user_id, Ticket};
use boothline_core::types::DbId;
use boothline_events::{EventBus, QueueChange, QueueEvent};
use tokio::sync::{broadcast, Mutex};

use crate::locks::KeyedLocks;
use crate::seed::default_points;
use crate::views::{
    JoinOutcome, JoinReceipt, LeaveOutcome, LeaveTarget, PointCount, PointSummary, UserTicket,
};

/// Queue-ticketing engine shared by all request handlers.
///
/// Cheap to share behind an `Arc`; all interior state is synchronized.
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    bus: Arc<EventBus>,
    user_locks: KeyedLocks<String>,
    point_locks: KeyedLocks<DbId>,
    settings_lock: Mutex<()>,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn QueueStore>, bus: Arc<EventBus>) -> Self {
        Self {
            store,
            bus,
            user_locks: KeyedLocks::new(),
            point_locks: KeyedLocks::new(),
            settings_lock: Mutex::new(()),
        }
    }

    /// Subscribe to queue-length changes published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.bus.subscribe()
    }

    /// Live subscriptions on the event bus, the observer fan-out included.
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Cheap round-trip to the backing store.
    pub async fn health_check(&self) -> Result<(), CoreError> {
        self.store.get_settings().await?;
        Ok(())
    }

    // ── Points (visitor view) ────────────────────────────────────────────

    /// Active points in ascending id order with their queue lengths.
    pub async fn list_points(&self) -> Result<Vec<PointSummary>, CoreError> {
        self.summaries(false).await
    }

    /// Current queue length of every active point.
    pub async fn snapshot(&self) -> Result<Vec<PointCount>, CoreError> {
        Ok(self
            .summaries(false)
            .await?
            .into_iter()
            .map(|p| PointCount {
                point_id: p.id,
                queued_count: p.queued_count,
            })
            .collect())
    }

    /// Publish the current count of every active point as `Snapshot` events.
    ///
    /// Lets observers that missed deltas converge. Returns the number of
    /// events published.
    pub async fn publish_snapshot(&self) -> Result<usize, CoreError> {
        let counts = self.snapshot().await?;
        for count in &counts {
            self.bus.publish(QueueEvent::new(
                count.point_id,
                count.queued_count,
                QueueChange::Snapshot,
            ));
        }
        Ok(counts.len())
    }

    // ── Tickets (visitor view) ───────────────────────────────────────────

    /// A visitor's active tickets with live position and ETA, oldest first.
    pub async fn list_user_tickets(&self, user_id: &str) -> Result<Vec<UserTicket>, CoreError> {
        let user_id = normalize_user_id(user_id)?;
        let tickets = self.store.active_tickets_for_user(user_id).await?;
        if tickets.is_empty() {
            return Ok(Vec::new());
        }

        let settings = self.store.get_settings().await?;
        let mut queues: HashMap<DbId, (Point, Vec<Ticket>)> = HashMap::new();
        let mut views = Vec::with_capacity(tickets.len());

        for ticket in tickets {
            if !queues.contains_key(&ticket.point_id) {
                // A point cannot disappear while tickets reference it.
                let Some(point) = self.store.get_point(ticket.point_id).await? else {
                    continue;
                };
                let queue = self.store.active_tickets_for_point(ticket.point_id).await?;
                queues.insert(ticket.point_id, (point, queue));
            }
            let Some((point, queue)) = queues.get(&ticket.point_id) else {
                continue;
            };

            let est = estimate(queue, &ticket, point.avg_service_time_sec);
            views.push(UserTicket {
                ticket_id: ticket.id,
                point_id: ticket.point_id,
                name: point.name.clone(),
                sector: point.sector.clone(),
                position: est.position,
                eta_minutes: est.eta_minutes,
                within_sla: settings.within_sla(est.eta_minutes),
            });
        }

        Ok(views)
    }

    // ── Admission ────────────────────────────────────────────────────────

    /// Admit a visitor to a point's queue.
    ///
    /// Checks, in order: the point exists and is active, the visitor is not
    /// already queued there (idempotent success), the per-visitor limit,
    /// the queue capacity. Only then is a ticket inserted.
    pub async fn join(&self, user_id: &str, point_id: DbId) -> Result<JoinOutcome, CoreError> {
        let user_id = normalize_user_id(user_id)?;

        let _user_guard = self.user_locks.lock(user_id.to_string()).await;
        let _point_guard = self.point_locks.lock(point_id).await;

        let point = self.require_point(point_id).await?;
        if !point.is_active {
            return Err(CoreError::InactivePoint { point_id });
        }

        let (ticket, position, queued_count) = match self.store.insert(user_id, point_id).await? {
            InsertOutcome::Inserted {
                ticket,
                position,
                queued,
            } => (ticket, position, queued),
            InsertOutcome::AlreadyActive(existing) => {
                let receipt = self.receipt(&point, &existing).await?;
                tracing::debug!(ticket_id = existing.id, point_id, user_id, "Visitor already queued");
                return Ok(JoinOutcome::AlreadyQueued(receipt));
            }
            InsertOutcome::PointClosed => return Err(CoreError::InactivePoint { point_id }),
            InsertOutcome::LimitReached { limit } => {
                tracing::info!(user_id, limit, "Active ticket limit reached");
                return Err(CoreError::LimitExceeded { limit });
            }
            InsertOutcome::QueueFull { max_queue } => {
                return Err(CoreError::QueueFull {
                    point_id,
                    max_queue,
                })
            }
        };

        tracing::info!(
            ticket_id = ticket.id,
            point_id,
            user_id,
            position,
            queued_count,
            "Visitor joined queue"
        );
        self.bus
            .publish(QueueEvent::new(point_id, queued_count, QueueChange::Joined));

        Ok(JoinOutcome::Joined(JoinReceipt {
            ticket_id: ticket.id,
            point_id,
            position,
            eta_minutes: eta_minutes(position, point.avg_service_time_sec),
        }))
    }

    /// Withdraw a visitor's active ticket.
    ///
    /// A ticket that is unknown, foreign or already finished is reported as
    /// `NotFound`, so a repeated leave is harmless.
    pub async fn leave(&self, user_id: &str, target: LeaveTarget) -> Result<LeaveOutcome, CoreError> {
        let user_id = normalize_user_id(user_id)?;
        let _user_guard = self.user_locks.lock(user_id.to_string()).await;

        let (ticket, not_found) = match target {
            LeaveTarget::Ticket(ticket_id) => (
                self.store
                    .find_ticket(ticket_id)
                    .await?
                    .filter(|t| t.user_id == user_id && t.is_active()),
                CoreError::NotFound {
                    entity: "Ticket",
                    id: ticket_id,
                },
            ),
            LeaveTarget::Point(point_id) => (
                self.store.find_active(user_id, point_id).await?,
                CoreError::NotFound {
                    entity: "Active ticket at point",
                    id: point_id,
                },
            ),
        };
        let Some(ticket) = ticket else {
            return Err(not_found);
        };

        let _point_guard = self.point_locks.lock(ticket.point_id).await;
        let Some(Transition {
            ticket: canceled,
            queued,
        }) = self.store.cancel(ticket.id, user_id).await?
        else {
            return Err(not_found);
        };

        tracing::info!(
            ticket_id = canceled.id,
            point_id = canceled.point_id,
            user_id,
            queued_count = queued,
            "Visitor left queue"
        );
        self.bus
            .publish(QueueEvent::new(canceled.point_id, queued, QueueChange::Left));

        Ok(LeaveOutcome {
            ticket_id: canceled.id,
            point_id: canceled.point_id,
            changed: true,
        })
    }

    // ── Operator hooks ───────────────────────────────────────────────────

    /// Serve the visitor at the head of a point's queue, if any.
    pub async fn serve_next(&self, point_id: DbId) -> Result<Option<Ticket>, CoreError> {
        let _point_guard = self.point_locks.lock(point_id).await;
        self.require_point(point_id).await?;

        Ok(self.store.serve_next(point_id).await?.map(|t| self.served(t)))
    }

    /// Serve a specific active ticket.
    pub async fn mark_served(&self, ticket_id: DbId) -> Result<Ticket, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "Ticket",
            id: ticket_id,
        };
        let ticket = self
            .store
            .find_ticket(ticket_id)
            .await?
            .filter(Ticket::is_active)
            .ok_or_else(not_found)?;

        let _point_guard = self.point_locks.lock(ticket.point_id).await;
        let transition = self
            .store
            .mark_served(ticket_id)
            .await?
            .ok_or_else(not_found)?;
        Ok(self.served(transition))
    }

    /// Log and publish a serve. Callers hold the point's lock.
    fn served(&self, Transition { ticket, queued }: Transition) -> Ticket {
        tracing::info!(
            ticket_id = ticket.id,
            point_id = ticket.point_id,
            queued_count = queued,
            "Ticket served"
        );
        self.bus
            .publish(QueueEvent::new(ticket.point_id, queued, QueueChange::Served));
        ticket
    }

    // ── Settings ─────────────────────────────────────────────────────────

    pub async fn settings(&self) -> Result<Settings, CoreError> {
        Ok(self.store.get_settings().await?)
    }

    /// Apply a partial settings update. An empty patch is rejected.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::Validation(
                "at least one of active_limit, sla_target_min is required".into(),
            ));
        }
        let _guard = self.settings_lock.lock().await;
        let next = patch.apply(self.store.get_settings().await?)?;
        self.store.save_settings(&next).await?;
        tracing::info!(
            active_limit = next.active_limit,
            sla_target_min = next.sla_target_min,
            "Settings updated"
        );
        Ok(next)
    }

    // ── Point administration ─────────────────────────────────────────────

    /// All points, including inactive ones, with their queue lengths.
    pub async fn list_all_points(&self) -> Result<Vec<PointSummary>, CoreError> {
        self.summaries(true).await
    }

    pub async fn get_point(&self, id: DbId) -> Result<PointSummary, CoreError> {
        let point = self.require_point(id).await?;
        let queued = count(&self.store.active_tickets_for_point(id).await?);
        Ok(PointSummary::new(point, queued))
    }

    pub async fn create_point(&self, input: PointInput) -> Result<PointSummary, CoreError> {
        let spec = input.into_spec()?;
        let point = self.store.create_point(&spec).await?;
        tracing::info!(point_id = point.id, name = %point.name, "Point created");
        Ok(PointSummary::new(point, 0))
    }

    pub async fn update_point(&self, id: DbId, input: PointInput) -> Result<PointSummary, CoreError> {
        let spec = input.into_spec()?;
        let _point_guard = self.point_locks.lock(id).await;
        let point = self
            .store
            .update_point(id, &spec)
            .await?
            .ok_or(CoreError::NotFound { entity: "Point", id })?;
        tracing::info!(point_id = id, max_queue = point.max_queue, "Point updated");
        self.point_changed(point).await
    }

    /// Open or close a point. Closing keeps existing tickets queued.
    pub async fn set_point_active(&self, id: DbId, is_active: bool) -> Result<PointSummary, CoreError> {
        let _point_guard = self.point_locks.lock(id).await;
        let point = self
            .store
            .set_point_active(id, is_active)
            .await?
            .ok_or(CoreError::NotFound { entity: "Point", id })?;
        tracing::info!(point_id = id, is_active, "Point activity changed");
        self.point_changed(point).await
    }

    /// Delete a point no ticket has ever referenced.
    pub async fn delete_point(&self, id: DbId) -> Result<(), CoreError> {
        let _point_guard = self.point_locks.lock(id).await;
        match self.store.delete_point(id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!(point_id = id, "Point deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(CoreError::NotFound { entity: "Point", id }),
            DeleteOutcome::Referenced { tickets } => Err(CoreError::Conflict(format!(
                "point {id} is referenced by {tickets} tickets; deactivate it instead"
            ))),
        }
    }

    /// Create the stock points when the registry is empty.
    ///
    /// Returns the number of points created.
    pub async fn seed_default_points(&self) -> Result<usize, CoreError> {
        if !self.store.list_points(true).await?.is_empty() {
            return Ok(0);
        }
        let specs = default_points();
        for spec in &specs {
            self.store.create_point(spec).await?;
        }
        tracing::info!(count = specs.len(), "Seeded default points");
        Ok(specs.len())
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    async fn require_point(&self, id: DbId) -> Result<Point, CoreError> {
        self.store
            .get_point(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "Point", id })
    }

    async fn receipt(&self, point: &Point, ticket: &Ticket) -> Result<JoinReceipt, CoreError> {
        let queue = self.store.active_tickets_for_point(point.id).await?;
        let est = estimate(&queue, ticket, point.avg_service_time_sec);
        Ok(JoinReceipt {
            ticket_id: ticket.id,
            point_id: point.id,
            position: est.position,
            eta_minutes: est.eta_minutes,
        })
    }

    async fn summaries(&self, include_inactive: bool) -> Result<Vec<PointSummary>, CoreError> {
        let points = self.store.list_points(include_inactive).await?;
        let counts = self.store.active_counts().await?;
        Ok(points
            .into_iter()
            .map(|p| {
                let queued = counts.get(&p.id).copied().unwrap_or(0);
                PointSummary::new(p, queued)
            })
            .collect())
    }

    async fn point_changed(&self, point: Point) -> Result<PointSummary, CoreError> {
        let queued = count(&self.store.active_tickets_for_point(point.id).await?);
        self.bus.publish(QueueEvent::new(
            point.id,
            queued,
            QueueChange::PointUpdated,
        ));
        Ok(PointSummary::new(point, queued))
    }
}

fn count(queue: &[Ticket]) -> u32 {
    u32::try_from(queue.len()).unwrap_or(u32::MAX)
}
