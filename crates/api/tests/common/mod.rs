#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use boothline_engine::{MemoryStore, QueueEngine};
use boothline_events::EventBus;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use boothline_api::config::ServerConfig;
use boothline_api::router::build_app_router;
use boothline_api::state::AppState;
use boothline_api::ws::WsManager;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        database_url: None,
        observer_buffer: 64,
        snapshot_interval_secs: 0,
        seed_default_points: false,
    }
}

/// Everything a test needs to drive the app and inspect its state.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn engine(&self) -> &Arc<QueueEngine> {
        &self.state.engine
    }
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same router builder as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let engine = Arc::new(QueueEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(EventBus::default()),
    ));

    let state = AppState {
        engine,
        ws_manager: Arc::new(WsManager::new(config.observer_buffer)),
        shutdown: CancellationToken::new(),
    };

    TestApp {
        router: build_app_router(state.clone(), &config),
        state,
    }
}

/// Send a request with an optional JSON body and return status plus parsed body.
///
/// Empty bodies parse as `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, Method::DELETE, uri, None).await
}

/// Create a point through the admin API and return its id.
pub async fn create_point(app: &Router, name: &str, max_queue: i64, avg: i64) -> i64 {
    let (status, json) = post_json(
        app,
        "/api/v1/admin/points",
        serde_json::json!({
            "name": name,
            "sector": "Sector 1",
            "avg_service_time_sec": avg,
            "max_queue": max_queue,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create point failed: {json}");
    json["data"]["id"].as_i64().unwrap()
}
