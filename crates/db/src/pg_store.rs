//! PostgreSQL-backed [`QueueStore`].
//!
//! [`QueueStore`]: boothline_core::store::QueueStore

use std::collections::HashMap;

use async_trait::async_trait;
use boothline_core::error::StoreError;
use boothline_core::point::{Point, PointSpec};
use boothline_core::settings::Settings;
use boothline_core::store::{
    DeleteOutcome, InsertOutcome, PointRegistry, SettingsStore, StoreResult, TicketStore,
    Transition,
};
use boothline_core::ticket::Ticket;
use boothline_core::types::DbId;

use crate::models::point::PointRow;
use crate::models::ticket::TicketRow;
use crate::repositories::settings_repo::{ACTIVE_LIMIT_KEY, SLA_TARGET_MIN_KEY};
use crate::repositories::ticket_repo::ACTIVE_UNIQUE_INDEX;
use crate::repositories::{Admission, Finished, PointRepo, SettingsRepo, TicketRepo};
use crate::retry::{classify, with_retry};
use crate::DbPool;

/// Queue store persisted in PostgreSQL.
#[derive(Clone)]
pub struct PgQueueStore {
    pool: DbPool,
}

impl PgQueueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn point(row: PointRow) -> StoreResult<Point> {
    Point::try_from(row)
}

fn points(rows: Vec<PointRow>) -> StoreResult<Vec<Point>> {
    rows.into_iter().map(Point::try_from).collect()
}

fn ticket(row: TicketRow) -> StoreResult<Ticket> {
    Ticket::try_from(row)
}

fn tickets(rows: Vec<TicketRow>) -> StoreResult<Vec<Ticket>> {
    rows.into_iter().map(Ticket::try_from).collect()
}

fn count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn transition(finished: Finished) -> StoreResult<Transition> {
    Ok(Transition {
        ticket: ticket(finished.row)?,
        queued: count(finished.queued),
    })
}

fn is_active_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(ACTIVE_UNIQUE_INDEX)
        }
        _ => false,
    }
}

#[async_trait]
impl PointRegistry for PgQueueStore {
    async fn get_point(&self, id: DbId) -> StoreResult<Option<Point>> {
        with_retry("get_point", || PointRepo::find_by_id(&self.pool, id))
            .await?
            .map(point)
            .transpose()
    }

    async fn list_points(&self, include_inactive: bool) -> StoreResult<Vec<Point>> {
        points(with_retry("list_points", || PointRepo::list(&self.pool, include_inactive)).await?)
    }

    async fn create_point(&self, spec: &PointSpec) -> StoreResult<Point> {
        // Not retried: a lost acknowledgement would create a duplicate.
        let row = PointRepo::create(&self.pool, spec).await.map_err(classify)?;
        point(row)
    }

    async fn update_point(&self, id: DbId, spec: &PointSpec) -> StoreResult<Option<Point>> {
        with_retry("update_point", || PointRepo::update(&self.pool, id, spec))
            .await?
            .map(point)
            .transpose()
    }

    async fn set_point_active(&self, id: DbId, is_active: bool) -> StoreResult<Option<Point>> {
        with_retry("set_point_active", || {
            PointRepo::set_active(&self.pool, id, is_active)
        })
        .await?
        .map(point)
        .transpose()
    }

    async fn delete_point(&self, id: DbId) -> StoreResult<DeleteOutcome> {
        with_retry("delete_point", || PointRepo::delete(&self.pool, id)).await
    }
}

#[async_trait]
impl TicketStore for PgQueueStore {
    async fn active_tickets_for_point(&self, point_id: DbId) -> StoreResult<Vec<Ticket>> {
        tickets(
            with_retry("active_tickets_for_point", || {
                TicketRepo::list_active_for_point(&self.pool, point_id)
            })
            .await?,
        )
    }

    async fn active_tickets_for_user(&self, user_id: &str) -> StoreResult<Vec<Ticket>> {
        tickets(
            with_retry("active_tickets_for_user", || {
                TicketRepo::list_active_for_user(&self.pool, user_id)
            })
            .await?,
        )
    }

    async fn find_active(&self, user_id: &str, point_id: DbId) -> StoreResult<Option<Ticket>> {
        with_retry("find_active", || {
            TicketRepo::find_active(&self.pool, user_id, point_id)
        })
        .await?
        .map(ticket)
        .transpose()
    }

    async fn find_ticket(&self, ticket_id: DbId) -> StoreResult<Option<Ticket>> {
        with_retry("find_ticket", || TicketRepo::find_by_id(&self.pool, ticket_id))
            .await?
            .map(ticket)
            .transpose()
    }

    async fn active_counts(&self) -> StoreResult<HashMap<DbId, u32>> {
        let rows = with_retry("active_counts", || TicketRepo::active_counts(&self.pool)).await?;
        Ok(rows
            .into_iter()
            .map(|(point_id, n)| (point_id, count(n)))
            .collect())
    }

    async fn insert(&self, user_id: &str, point_id: DbId) -> StoreResult<InsertOutcome> {
        let admission = with_retry("insert_ticket", || async move {
            match TicketRepo::admit(&self.pool, user_id, point_id).await {
                // Another process won the race for the same (visitor, point).
                Err(e) if is_active_unique_violation(&e) => {
                    match TicketRepo::find_active(&self.pool, user_id, point_id).await? {
                        Some(existing) => Ok(Admission::AlreadyActive(existing)),
                        None => Err(e),
                    }
                }
                other => other,
            }
        })
        .await?;

        Ok(match admission {
            Admission::Inserted {
                row,
                position,
                queued,
            } => InsertOutcome::Inserted {
                ticket: ticket(row)?,
                position: count(position),
                queued: count(queued),
            },
            Admission::AlreadyActive(row) => InsertOutcome::AlreadyActive(ticket(row)?),
            Admission::PointClosed => InsertOutcome::PointClosed,
            Admission::LimitReached { limit } => InsertOutcome::LimitReached {
                limit: count(limit),
            },
            Admission::QueueFull { max_queue } => InsertOutcome::QueueFull {
                max_queue: u32::try_from(max_queue).unwrap_or(0),
            },
        })
    }

    async fn cancel(&self, ticket_id: DbId, user_id: &str) -> StoreResult<Option<Transition>> {
        with_retry("cancel_ticket", || {
            TicketRepo::cancel(&self.pool, ticket_id, user_id)
        })
        .await?
        .map(transition)
        .transpose()
    }

    async fn serve_next(&self, point_id: DbId) -> StoreResult<Option<Transition>> {
        with_retry("serve_next", || TicketRepo::serve_next(&self.pool, point_id))
            .await?
            .map(transition)
            .transpose()
    }

    async fn mark_served(&self, ticket_id: DbId) -> StoreResult<Option<Transition>> {
        with_retry("mark_served", || TicketRepo::mark_served(&self.pool, ticket_id))
            .await?
            .map(transition)
            .transpose()
    }
}

#[async_trait]
impl SettingsStore for PgQueueStore {
    async fn get_settings(&self) -> StoreResult<Settings> {
        let rows = with_retry("get_settings", || SettingsRepo::list(&self.pool)).await?;
        let mut settings = Settings::default();
        for (key, value) in rows {
            let value = u32::try_from(value)
                .map_err(|_| StoreError::Backend(format!("setting {key} out of range: {value}")))?;
            match key.as_str() {
                ACTIVE_LIMIT_KEY => settings.active_limit = value,
                SLA_TARGET_MIN_KEY => settings.sla_target_min = value,
                other => tracing::debug!(key = other, "Ignoring unknown setting"),
            }
        }
        Ok(settings)
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        let pairs = [
            (ACTIVE_LIMIT_KEY, i64::from(settings.active_limit)),
            (SLA_TARGET_MIN_KEY, i64::from(settings.sla_target_min)),
        ];
        with_retry("save_settings", || SettingsRepo::upsert_all(&self.pool, &pairs)).await
    }
}
