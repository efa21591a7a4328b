mod common;

use axum::http::StatusCode;
use common::{build_test_app, get};

#[tokio::test]
async fn health_reports_ok_with_memory_store() {
    let app = build_test_app();

    let (status, json) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store_healthy"], true);
    assert_eq!(json["observers"], 0);
    assert_eq!(json["subscribers"], 0);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn health_counts_event_subscribers() {
    let app = build_test_app();
    let _rx = app.engine().subscribe();
    let _ws = app.state.ws_manager.add("observer".into()).await;

    let (_, json) = get(&app.router, "/health").await;

    assert_eq!(json["subscribers"], 1);
    assert_eq!(json["observers"], 1);
}

#[tokio::test]
async fn health_is_not_under_api_prefix() {
    let app = build_test_app();

    let (status, _) = get(&app.router, "/api/v1/health").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
