//! Route definitions for point administration and operator actions.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /points                    -> list_points (inactive included)
/// POST   /points                    -> create_point
/// GET    /points/{id}               -> get_point
/// PUT    /points/{id}               -> update_point
/// DELETE /points/{id}               -> delete_point
/// PUT    /points/{id}/active        -> set_active
/// POST   /points/{id}/serve-next    -> serve_next
/// POST   /tickets/{id}/serve        -> mark_served
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/points", get(admin::list_points).post(admin::create_point))
        .route(
            "/points/{id}",
            get(admin::get_point)
                .put(admin::update_point)
                .delete(admin::delete_point),
        )
        .route("/points/{id}/active", put(admin::set_active))
        .route("/points/{id}/serve-next", post(admin::serve_next))
        .route("/tickets/{id}/serve", post(admin::mark_served))
}
