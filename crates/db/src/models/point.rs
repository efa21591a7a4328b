//! Row model for the `points` table.

use boothline_core::error::StoreError;
use boothline_core::point::Point;
use boothline_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `points` table.
#[derive(Debug, Clone, FromRow)]
pub struct PointRow {
    pub id: DbId,
    pub name: String,
    pub sector: String,
    pub description: String,
    pub avg_service_time_sec: i32,
    pub max_queue: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<PointRow> for Point {
    type Error = StoreError;

    fn try_from(row: PointRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let out_of_range =
            |column: &str| StoreError::Backend(format!("points.{column} out of range for row {id}"));
        Ok(Point {
            id: row.id,
            avg_service_time_sec: u32::try_from(row.avg_service_time_sec)
                .map_err(|_| out_of_range("avg_service_time_sec"))?,
            max_queue: u32::try_from(row.max_queue).map_err(|_| out_of_range("max_queue"))?,
            name: row.name,
            sector: row.sector,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}
