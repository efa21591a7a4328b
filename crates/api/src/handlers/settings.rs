//! Handlers for process-wide admission settings.

use axum::extract::State;
use axum::Json;
use boothline_core::settings::{Settings, SettingsPatch};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn get(State(state): State<AppState>) -> AppResult<Json<DataResponse<Settings>>> {
    let settings = state.engine.settings().await?;
    Ok(Json(DataResponse::new(settings)))
}

/// PUT /api/v1/settings
///
/// Partial update; omitted fields keep their current value.
pub async fn update(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> AppResult<Json<DataResponse<Settings>>> {
    let settings = state.engine.update_settings(patch).await?;
    Ok(Json(DataResponse::new(settings)))
}
