//! Row model for the `queue_tickets` table.

use boothline_core::error::StoreError;
use boothline_core::ticket::{Ticket, TicketStatus};
use boothline_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `queue_tickets` table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: DbId,
    pub user_id: String,
    pub point_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = StoreError;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        let status: TicketStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Backend(format!("ticket {}: {e}", row.id)))?;
        Ok(Ticket {
            id: row.id,
            user_id: row.user_id,
            point_id: row.point_id,
            status,
            created_at: row.created_at,
            finished_at: row.finished_at,
        })
    }
}
