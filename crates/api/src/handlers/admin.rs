//! Handlers for point administration and operator actions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use boothline_core::point::PointInput;
use boothline_core::ticket::Ticket;
use boothline_core::types::DbId;
use boothline_engine::PointSummary;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// GET /api/v1/admin/points
///
/// Every point, inactive ones included.
pub async fn list_points(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PointSummary>>>> {
    let points = state.engine.list_all_points().await?;
    Ok(Json(DataResponse::new(points)))
}

/// POST /api/v1/admin/points
pub async fn create_point(
    State(state): State<AppState>,
    Json(input): Json<PointInput>,
) -> AppResult<(StatusCode, Json<DataResponse<PointSummary>>)> {
    let point = state.engine.create_point(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(point))))
}

/// GET /api/v1/admin/points/{id}
pub async fn get_point(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PointSummary>>> {
    let point = state.engine.get_point(id).await?;
    Ok(Json(DataResponse::new(point)))
}

/// PUT /api/v1/admin/points/{id}
pub async fn update_point(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PointInput>,
) -> AppResult<Json<DataResponse<PointSummary>>> {
    let point = state.engine.update_point(id, input).await?;
    Ok(Json(DataResponse::new(point)))
}

/// DELETE /api/v1/admin/points/{id}
///
/// Refused with `409` once any ticket references the point.
pub async fn delete_point(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.engine.delete_point(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/points/{id}/active
pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetActiveRequest>,
) -> AppResult<Json<DataResponse<PointSummary>>> {
    let point = state.engine.set_point_active(id, input.is_active).await?;
    Ok(Json(DataResponse::new(point)))
}

/// POST /api/v1/admin/points/{id}/serve-next
///
/// `data` is `null` when the queue is empty.
pub async fn serve_next(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<Ticket>>>> {
    let served = state.engine.serve_next(id).await?;
    Ok(Json(DataResponse::new(served)))
}

/// POST /api/v1/admin/tickets/{id}/serve
pub async fn mark_served(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Ticket>>> {
    let served = state.engine.mark_served(id).await?;
    Ok(Json(DataResponse::new(served)))
}
