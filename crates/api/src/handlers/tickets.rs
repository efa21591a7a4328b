//! Handlers for a visitor's tickets.

use axum::extract::{Path, State};
use axum::Json;
use boothline_engine::UserTicket;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/tickets
///
/// The visitor's active tickets with live position, ETA and SLA flag.
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<DataResponse<Vec<UserTicket>>>> {
    let tickets = state.engine.list_user_tickets(&user_id).await?;
    Ok(Json(DataResponse::new(tickets)))
}
