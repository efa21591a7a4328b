//! Position and ETA calculation (pure logic).
//!
//! A ticket's position is its 1-based rank among the active tickets of its
//! point, ordered by `(created_at, id)`. The ETA multiplies the position by
//! the point's average service time. Both are recomputed on every read and
//! never stored.

use serde::Serialize;

use crate::ticket::Ticket;

/// Seconds per minute, for ETA rounding.
const SECS_PER_MINUTE: u64 = 60;

/// Position of a ticket and the wait derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Estimate {
    pub position: u32,
    pub eta_minutes: u32,
}

/// Rank of `ticket` within `queue`.
///
/// `queue` may be in any order and may contain inactive tickets or tickets
/// of other points; only active tickets of the same point that precede
/// `ticket` are counted.
pub fn position(queue: &[Ticket], ticket: &Ticket) -> u32 {
    let ahead = queue
        .iter()
        .filter(|t| t.is_active() && t.point_id == ticket.point_id && t.precedes(ticket))
        .count();
    u32::try_from(ahead).map_or(u32::MAX, |n| n.saturating_add(1))
}

/// `max(1, ceil(position * avg_service_time_sec / 60))`.
pub fn eta_minutes(position: u32, avg_service_time_sec: u32) -> u32 {
    let total_secs = u64::from(position) * u64::from(avg_service_time_sec);
    let minutes = total_secs.div_ceil(SECS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Position and ETA of `ticket` in one go.
pub fn estimate(queue: &[Ticket], ticket: &Ticket, avg_service_time_sec: u32) -> Estimate {
    let position = position(queue, ticket);
    Estimate {
        position,
        eta_minutes: eta_minutes(position, avg_service_time_sec),
    }
}

/// Sort tickets into queue order in place.
pub fn sort_queue(queue: &mut [Ticket]) {
    queue.sort_by(|a, b| a.queue_cmp(b));
}
