mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use boothline_api::fanout::ObserverFanout;
use common::{build_test_app, create_point};
use futures::StreamExt;
use http_body_util::BodyExt;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

type Client =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Read the next text frame as JSON, skipping pings.
async fn next_update(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for update")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Read the next SSE event from a streaming body as text.
async fn next_event(body: &mut Body) -> String {
    let frame = tokio::time::timeout(RECV_TIMEOUT, body.frame())
        .await
        .expect("timed out waiting for event")
        .expect("stream ended")
        .unwrap();
    String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

#[tokio::test]
async fn websocket_observer_gets_snapshot_then_live_updates() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;
    app.engine().join("alice", point_id).await.unwrap();

    let cancel = app.state.shutdown.clone();
    let fanout = ObserverFanout::new(Arc::clone(app.engine()), Arc::clone(&app.state.ws_manager));
    tokio::spawn(fanout.run(app.engine().subscribe(), cancel.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws"))
        .await
        .unwrap();

    let snapshot = next_update(&mut client).await;
    assert_eq!(
        snapshot,
        serde_json::json!({ "point_id": point_id, "queued_count": 1 })
    );

    app.engine().join("bob", point_id).await.unwrap();
    let joined = next_update(&mut client).await;
    assert_eq!(joined["queued_count"], 2);

    app.engine().serve_next(point_id).await.unwrap();
    let served = next_update(&mut client).await;
    assert_eq!(served["queued_count"], 1);

    cancel.cancel();
}

#[tokio::test]
async fn websocket_observer_is_unregistered_after_disconnect() {
    let app = build_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move { axum::serve(listener, router).await });

    let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws"))
        .await
        .unwrap();
    client.close(None).await.unwrap();

    let ws_manager = Arc::clone(&app.state.ws_manager);
    tokio::time::timeout(RECV_TIMEOUT, async move {
        while ws_manager.connection_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("observer was not removed");
}

// ---------------------------------------------------------------------------
// Server-Sent Events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sse_observer_gets_snapshot_then_live_updates() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "Attraction", 0, 60).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );

    let mut body = response.into_body();

    let snapshot = next_event(&mut body).await;
    assert!(snapshot.starts_with("event: update\n"), "{snapshot}");
    assert!(snapshot.contains(&format!("\"point_id\":{point_id}")));
    assert!(snapshot.contains("\"queued_count\":0"));

    app.engine().join("alice", point_id).await.unwrap();

    let live = next_event(&mut body).await;
    assert!(live.contains("\"queued_count\":1"), "{live}");
}

#[tokio::test]
async fn sse_stream_ends_on_shutdown() {
    let app = build_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    app.state.shutdown.cancel();

    let collected = tokio::time::timeout(RECV_TIMEOUT, response.into_body().collect())
        .await
        .expect("stream did not end after shutdown");
    assert!(collected.is_ok());
}
