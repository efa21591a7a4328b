//! Repository for the `points` table.

use boothline_core::point::PointSpec;
use boothline_core::store::DeleteOutcome;
use boothline_core::types::DbId;
use sqlx::PgPool;

use crate::models::point::PointRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, sector, description, avg_service_time_sec, max_queue, \
                       is_active, created_at, updated_at";

/// Provides CRUD operations for service points.
pub struct PointRepo;

impl PointRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PointRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM points WHERE id = $1");
        sqlx::query_as::<_, PointRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List points ordered by id, optionally including inactive ones.
    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<PointRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM points WHERE ($1 OR is_active) ORDER BY id"
        );
        sqlx::query_as::<_, PointRow>(&query)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    /// Insert a new point. A spec without an explicit flag creates an active point.
    pub async fn create(pool: &PgPool, spec: &PointSpec) -> Result<PointRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO points (name, sector, description, avg_service_time_sec, max_queue, is_active)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PointRow>(&query)
            .bind(&spec.name)
            .bind(&spec.sector)
            .bind(&spec.description)
            .bind(to_int(spec.avg_service_time_sec))
            .bind(to_int(spec.max_queue))
            .bind(spec.is_active)
            .fetch_one(pool)
            .await
    }

    /// Replace a point's attributes. A `None` active flag keeps the current value.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        spec: &PointSpec,
    ) -> Result<Option<PointRow>, sqlx::Error> {
        let query = format!(
            "UPDATE points SET
                name = $2,
                sector = $3,
                description = $4,
                avg_service_time_sec = $5,
                max_queue = $6,
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PointRow>(&query)
            .bind(id)
            .bind(&spec.name)
            .bind(&spec.sector)
            .bind(&spec.description)
            .bind(to_int(spec.avg_service_time_sec))
            .bind(to_int(spec.max_queue))
            .bind(spec.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<PointRow>, sqlx::Error> {
        let query = format!(
            "UPDATE points SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PointRow>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a point unless any ticket, active or historical, references it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<DeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM points WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let tickets: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queue_tickets WHERE point_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if tickets > 0 {
            return Ok(DeleteOutcome::Referenced {
                tickets: tickets as u64,
            });
        }

        sqlx::query("DELETE FROM points WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

/// Point attributes are bounded well below `i32::MAX` by input validation.
fn to_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
