//! Repository for the `queue_tickets` table.

use boothline_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::ticket::TicketRow;
use crate::repositories::settings_repo::ACTIVE_LIMIT_KEY;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, point_id, status, created_at, finished_at";

/// Name of the partial unique index guarding one active ticket per (visitor, point).
pub const ACTIVE_UNIQUE_INDEX: &str = "uq_queue_tickets_active_user_point";

/// Result of [`TicketRepo::admit`].
#[derive(Debug)]
pub enum Admission {
    Inserted {
        row: TicketRow,
        position: i64,
        queued: i64,
    },
    AlreadyActive(TicketRow),
    /// The point row is missing or inactive.
    PointClosed,
    LimitReached { limit: i64 },
    QueueFull { max_queue: i32 },
}

/// A ticket moved out of `active`, with its point's active count taken in
/// the same transaction.
#[derive(Debug)]
pub struct Finished {
    pub row: TicketRow,
    pub queued: i64,
}

/// Provides ticket lifecycle operations.
pub struct TicketRepo;

impl TicketRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM queue_tickets WHERE id = $1");
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_active(
        pool: &PgPool,
        user_id: &str,
        point_id: DbId,
    ) -> Result<Option<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM queue_tickets
             WHERE user_id = $1 AND point_id = $2 AND status = 'active'"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(user_id)
            .bind(point_id)
            .fetch_optional(pool)
            .await
    }

    /// Active tickets of a point in queue order.
    pub async fn list_active_for_point(
        pool: &PgPool,
        point_id: DbId,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM queue_tickets
             WHERE point_id = $1 AND status = 'active'
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(point_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Vec<TicketRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM queue_tickets
             WHERE user_id = $1 AND status = 'active'
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, TicketRow>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// `(point_id, active count)` for every point with a non-empty queue.
    pub async fn active_counts(pool: &PgPool) -> Result<Vec<(DbId, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (DbId, i64)>(
            "SELECT point_id, COUNT(*) FROM queue_tickets
             WHERE status = 'active'
             GROUP BY point_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Check-and-insert in one transaction.
    ///
    /// Takes a transaction-scoped advisory lock on the visitor, then locks
    /// the point row `FOR UPDATE`, which serializes admissions of the same
    /// visitor and to the same point across processes. Activity, capacity,
    /// uniqueness and the visitor limit are all read under those locks.
    /// `max_queue == 0` and `active_limit == 0` mean unbounded.
    pub async fn admit(
        pool: &PgPool,
        user_id: &str,
        point_id: DbId,
    ) -> Result<Admission, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let point: Option<(i32, bool)> =
            sqlx::query_as("SELECT max_queue, is_active FROM points WHERE id = $1 FOR UPDATE")
                .bind(point_id)
                .fetch_optional(&mut *tx)
                .await?;
        let max_queue = match point {
            Some((max_queue, true)) => max_queue,
            _ => return Ok(Admission::PointClosed),
        };

        let existing_query = format!(
            "SELECT {COLUMNS} FROM queue_tickets
             WHERE user_id = $1 AND point_id = $2 AND status = 'active'"
        );
        let existing = sqlx::query_as::<_, TicketRow>(&existing_query)
            .bind(user_id)
            .bind(point_id)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(existing) = existing {
            return Ok(Admission::AlreadyActive(existing));
        }

        let limit: i64 = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(ACTIVE_LIMIT_KEY)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or(0);
        if limit > 0 {
            let held: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM queue_tickets WHERE user_id = $1 AND status = 'active'",
            )
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            if held >= limit {
                return Ok(Admission::LimitReached { limit });
            }
        }

        let queued = count_active(&mut *tx, point_id).await?;
        if max_queue > 0 && queued >= i64::from(max_queue) {
            return Ok(Admission::QueueFull { max_queue });
        }

        let insert_query = format!(
            "INSERT INTO queue_tickets (user_id, point_id, status)
             VALUES ($1, $2, 'active')
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, TicketRow>(&insert_query)
            .bind(user_id)
            .bind(point_id)
            .fetch_one(&mut *tx)
            .await?;

        let (position, queued): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE (created_at, id) <= ($2, $3)), COUNT(*)
             FROM queue_tickets
             WHERE point_id = $1 AND status = 'active'",
        )
        .bind(point_id)
        .bind(row.created_at)
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Admission::Inserted {
            row,
            position,
            queued,
        })
    }

    /// Cancel an active ticket owned by `user_id`. Returns `None` when nothing changed.
    pub async fn cancel(
        pool: &PgPool,
        ticket_id: DbId,
        user_id: &str,
    ) -> Result<Option<Finished>, sqlx::Error> {
        let query = format!(
            "UPDATE queue_tickets SET status = 'canceled', finished_at = NOW()
             WHERE id = $1 AND user_id = $2 AND status = 'active'
             RETURNING {COLUMNS}"
        );
        let mut tx = pool.begin().await?;
        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(ticket_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        finish(tx, row).await
    }

    /// Serve the head of a point's queue.
    pub async fn serve_next(pool: &PgPool, point_id: DbId) -> Result<Option<Finished>, sqlx::Error> {
        let query = format!(
            "UPDATE queue_tickets SET status = 'served', finished_at = NOW()
             WHERE id = (
                 SELECT id FROM queue_tickets
                 WHERE point_id = $1 AND status = 'active'
                 ORDER BY created_at, id
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        let mut tx = pool.begin().await?;
        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(point_id)
            .fetch_optional(&mut *tx)
            .await?;
        finish(tx, row).await
    }

    pub async fn mark_served(pool: &PgPool, ticket_id: DbId) -> Result<Option<Finished>, sqlx::Error> {
        let query = format!(
            "UPDATE queue_tickets SET status = 'served', finished_at = NOW()
             WHERE id = $1 AND status = 'active'
             RETURNING {COLUMNS}"
        );
        let mut tx = pool.begin().await?;
        let row = sqlx::query_as::<_, TicketRow>(&query)
            .bind(ticket_id)
            .fetch_optional(&mut *tx)
            .await?;
        finish(tx, row).await
    }
}

async fn count_active(conn: &mut PgConnection, point_id: DbId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM queue_tickets WHERE point_id = $1 AND status = 'active'")
        .bind(point_id)
        .fetch_one(conn)
        .await
}

/// Count the changed ticket's queue inside `tx`, then commit.
async fn finish(
    mut tx: sqlx::Transaction<'_, sqlx::Postgres>,
    row: Option<TicketRow>,
) -> Result<Option<Finished>, sqlx::Error> {
    let Some(row) = row else {
        return Ok(None);
    };
    let queued = count_active(&mut *tx, row.point_id).await?;
    tx.commit().await?;
    Ok(Some(Finished { row, queued }))
}
