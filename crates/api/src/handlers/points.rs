//! Handlers for the visitor-facing `/points` resource.

use axum::extract::State;
use axum::Json;
use boothline_engine::PointSummary;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/points
///
/// Active points in id order with their current queue lengths.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<PointSummary>>>> {
    let points = state.engine.list_points().await?;
    Ok(Json(DataResponse::new(points)))
}
