//! Tickets: a visitor's claim on a place in a point's queue.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Longest accepted visitor identifier.
pub const MAX_USER_ID_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a ticket. Only `Active` tickets occupy a queue slot;
/// the other two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Active,
    Served,
    Canceled,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Served => "served",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "served" => Ok(Self::Served),
            "canceled" => Ok(Self::Canceled),
            other => Err(CoreError::Validation(format!(
                "unknown ticket status '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Ticket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: DbId,
    pub user_id: String,
    pub point_id: DbId,
    pub status: TicketStatus,
    pub created_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

impl Ticket {
    pub fn is_active(&self) -> bool {
        self.status == TicketStatus::Active
    }

    /// Queue order: creation time, then id. Timestamps can collide under
    /// concurrent inserts, the id never does.
    pub fn queue_cmp(&self, other: &Ticket) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then(self.id.cmp(&other.id))
    }

    /// Whether `self` is ahead of `other` in the queue.
    pub fn precedes(&self, other: &Ticket) -> bool {
        self.queue_cmp(other) == Ordering::Less
    }
}

// ---------------------------------------------------------------------------
// Visitor identity
// ---------------------------------------------------------------------------

/// Normalize an opaque, client-generated visitor id.
///
/// The id is an untrusted key, not an authenticated identity: it only has
/// to be non-blank and bounded in length.
pub fn normalize_user_id(raw: &str) -> Result<&str, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("user_id is required".into()));
    }
    if trimmed.len() > MAX_USER_ID_LEN {
        return Err(CoreError::Validation(format!(
            "user_id must be at most {MAX_USER_ID_LEN} characters"
        )));
    }
    Ok(trimmed)
}
