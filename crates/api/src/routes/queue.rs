//! Route definitions for the visitor-facing resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{points, queue, settings, tickets};
use crate::state::AppState;

/// Routes mounted at `/points`.
///
/// ```text
/// GET    /                    -> list (active only)
/// ```
pub fn points_router() -> Router<AppState> {
    Router::new().route("/", get(points::list))
}

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /{user_id}/tickets   -> list_for_user
/// ```
pub fn users_router() -> Router<AppState> {
    Router::new().route("/{user_id}/tickets", get(tickets::list_for_user))
}

/// Routes mounted at `/queue`.
///
/// ```text
/// POST   /join                -> join
/// POST   /leave               -> leave
/// ```
pub fn queue_router() -> Router<AppState> {
    Router::new()
        .route("/join", post(queue::join))
        .route("/leave", post(queue::leave))
}

/// Routes mounted at `/settings`.
///
/// ```text
/// GET    /                    -> get
/// PUT    /                    -> update (partial)
/// ```
pub fn settings_router() -> Router<AppState> {
    Router::new().route("/", get(settings::get).put(settings::update))
}
