//! Read models and operation outcomes returned by [`QueueEngine`].
//!
//! [`QueueEngine`]: crate::QueueEngine

use boothline_core::point::Point;
use boothline_core::types::DbId;
use serde::Serialize;

/// A point together with its current queue length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PointSummary {
    pub id: DbId,
    pub name: String,
    pub sector: String,
    pub description: String,
    pub is_active: bool,
    pub avg_service_time_sec: u32,
    pub max_queue: u32,
    pub queued_count: u32,
}

impl PointSummary {
    pub fn new(point: Point, queued_count: u32) -> Self {
        Self {
            id: point.id,
            name: point.name,
            sector: point.sector,
            description: point.description,
            is_active: point.is_active,
            avg_service_time_sec: point.avg_service_time_sec,
            max_queue: point.max_queue,
            queued_count,
        }
    }
}

/// One of a visitor's active tickets with its live position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTicket {
    pub ticket_id: DbId,
    pub point_id: DbId,
    pub name: String,
    pub sector: String,
    pub position: u32,
    pub eta_minutes: u32,
    /// Whether the ETA is within the configured SLA target.
    pub within_sla: bool,
}

/// Ticket coordinates handed back by a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JoinReceipt {
    pub ticket_id: DbId,
    pub point_id: DbId,
    pub position: u32,
    pub eta_minutes: u32,
}

/// Result of an admission request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A new ticket was issued.
    Joined(JoinReceipt),
    /// The visitor was already queued at this point; nothing changed.
    AlreadyQueued(JoinReceipt),
}

impl JoinOutcome {
    pub fn receipt(&self) -> &JoinReceipt {
        match self {
            Self::Joined(r) | Self::AlreadyQueued(r) => r,
        }
    }
}

/// How a visitor identifies the ticket to withdraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveTarget {
    Ticket(DbId),
    Point(DbId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeaveOutcome {
    pub ticket_id: DbId,
    pub point_id: DbId,
    pub changed: bool,
}

/// Queue length of one point, as pushed to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointCount {
    pub point_id: DbId,
    pub queued_count: u32,
}
