pub mod admin;
pub mod health;
pub mod queue;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  observer (WebSocket)
/// /stream                              observer (Server-Sent Events)
///
/// /points                              active points with queue lengths
/// /users/{user_id}/tickets             a visitor's active tickets
/// /queue/join                          join (POST)
/// /queue/leave                         leave (POST)
/// /settings                            get, update (PUT)
///
/// /admin/points                        list, create
/// /admin/points/{id}                   get, update, delete
/// /admin/points/{id}/active            open / close (PUT)
/// /admin/points/{id}/serve-next        serve the head of the queue (POST)
/// /admin/tickets/{id}/serve            serve a specific ticket (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Observer endpoints.
        .route("/ws", get(ws::ws_handler))
        .route("/stream", get(handlers::stream::sse_handler))
        // Visitor-facing routes.
        .nest("/points", queue::points_router())
        .nest("/users", queue::users_router())
        .nest("/queue", queue::queue_router())
        .nest("/settings", queue::settings_router())
        // Point administration and operator actions.
        .nest("/admin", admin::router())
}
