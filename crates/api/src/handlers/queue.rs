//! Handlers for joining and leaving queues.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use boothline_core::types::DbId;
use boothline_engine::{JoinOutcome, JoinReceipt, LeaveOutcome, LeaveTarget};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub user_id: String,
    pub point_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    #[serde(flatten)]
    pub receipt: JoinReceipt,
    /// `true` when the visitor already held this ticket and nothing changed.
    pub already_queued: bool,
}

/// Identify the ticket either directly or by the point it queues at.
#[derive(Debug, Deserialize)]
pub struct LeaveRequest {
    pub user_id: String,
    #[serde(default)]
    pub ticket_id: Option<DbId>,
    #[serde(default)]
    pub point_id: Option<DbId>,
}

impl LeaveRequest {
    fn target(&self) -> Result<LeaveTarget, AppError> {
        match (self.ticket_id, self.point_id) {
            (Some(ticket_id), None) => Ok(LeaveTarget::Ticket(ticket_id)),
            (None, Some(point_id)) => Ok(LeaveTarget::Point(point_id)),
            _ => Err(AppError::BadRequest(
                "exactly one of ticket_id or point_id is required".into(),
            )),
        }
    }
}

/// POST /api/v1/queue/join
///
/// `201 Created` for a new ticket, `200 OK` with `already_queued: true`
/// when the visitor was already in this queue.
pub async fn join(
    State(state): State<AppState>,
    Json(input): Json<JoinRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<JoinResponse>>)> {
    let (status, receipt, already_queued) =
        match state.engine.join(&input.user_id, input.point_id).await? {
            JoinOutcome::Joined(receipt) => (StatusCode::CREATED, receipt, false),
            JoinOutcome::AlreadyQueued(receipt) => (StatusCode::OK, receipt, true),
        };
    Ok((
        status,
        Json(DataResponse::new(JoinResponse {
            receipt,
            already_queued,
        })),
    ))
}

/// POST /api/v1/queue/leave
pub async fn leave(
    State(state): State<AppState>,
    Json(input): Json<LeaveRequest>,
) -> AppResult<Json<DataResponse<LeaveOutcome>>> {
    let target = input.target()?;
    let outcome = state.engine.leave(&input.user_id, target).await?;
    Ok(Json(DataResponse::new(outcome)))
}
