mod common;

use axum::http::StatusCode;
use common::{build_test_app, create_point, get, post_json, put_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_returns_created_with_position_and_eta() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 90).await;

    let (status, json) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &json["data"];
    assert_eq!(data["point_id"], point_id);
    assert_eq!(data["position"], 1);
    assert_eq!(data["eta_minutes"], 2);
    assert_eq!(data["already_queued"], false);
    assert!(data["ticket_id"].is_i64());
}

#[tokio::test]
async fn rejoin_is_idempotent_and_returns_ok() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;
    let body = json!({ "user_id": "alice", "point_id": point_id });

    let (_, first) = post_json(&app.router, "/api/v1/queue/join", body.clone()).await;
    let (status, second) = post_json(&app.router, "/api/v1/queue/join", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["already_queued"], true);
    assert_eq!(second["data"]["ticket_id"], first["data"]["ticket_id"]);
    assert_eq!(second["data"]["position"], 1);
}

#[tokio::test]
async fn join_full_queue_returns_conflict() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "Attraction", 1, 60).await;

    post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;
    let (status, json) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "bob", "point_id": point_id }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "QUEUE_FULL");
}

#[tokio::test]
async fn join_unknown_point_returns_not_found() {
    let app = build_test_app();

    let (status, json) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": 999 }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn join_blank_user_returns_validation_error() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;

    let (status, json) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "   ", "point_id": point_id }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Leave
// ---------------------------------------------------------------------------

#[tokio::test]
async fn leave_by_point_removes_ticket() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;
    let (_, joined) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;

    let (status, json) = post_json(
        &app.router,
        "/api/v1/queue/leave",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["ticket_id"], joined["data"]["ticket_id"]);
    assert_eq!(json["data"]["changed"], true);

    let (_, points) = get(&app.router, "/api/v1/points").await;
    assert_eq!(points["data"][0]["queued_count"], 0);
}

#[tokio::test]
async fn leave_by_ticket_twice_returns_not_found() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;
    let (_, joined) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;
    let body = json!({ "user_id": "alice", "ticket_id": joined["data"]["ticket_id"] });

    let (first, _) = post_json(&app.router, "/api/v1/queue/leave", body.clone()).await;
    let (second, json) = post_json(&app.router, "/api/v1/queue/leave", body).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn leave_someone_elses_ticket_returns_not_found() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;
    let (_, joined) = post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;

    let (status, _) = post_json(
        &app.router,
        "/api/v1/queue/leave",
        json!({ "user_id": "mallory", "ticket_id": joined["data"]["ticket_id"] }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn leave_requires_exactly_one_target() {
    let app = build_test_app();

    let (neither, json) = post_json(
        &app.router,
        "/api/v1/queue/leave",
        json!({ "user_id": "alice" }),
    )
    .await;
    assert_eq!(neither, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let (both, _) = post_json(
        &app.router,
        "/api/v1/queue/leave",
        json!({ "user_id": "alice", "ticket_id": 1, "point_id": 1 }),
    )
    .await;
    assert_eq!(both, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn points_list_hides_inactive_and_reports_counts() {
    let app = build_test_app();
    let open = create_point(&app.router, "Attraction", 0, 60).await;
    let closed = create_point(&app.router, "T-Launch", 0, 60).await;
    put_json(
        &app.router,
        &format!("/api/v1/admin/points/{closed}/active"),
        json!({ "is_active": false }),
    )
    .await;
    post_json(
        &app.router,
        "/api/v1/queue/join",
        json!({ "user_id": "alice", "point_id": open }),
    )
    .await;

    let (status, json) = get(&app.router, "/api/v1/points").await;

    assert_eq!(status, StatusCode::OK);
    let points = json["data"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["id"], open);
    assert_eq!(points[0]["name"], "Attraction");
    assert_eq!(points[0]["queued_count"], 1);
}

#[tokio::test]
async fn user_tickets_show_live_positions() {
    let app = build_test_app();
    let point_id = create_point(&app.router, "T-City", 0, 60).await;
    for user in ["alice", "bob"] {
        post_json(
            &app.router,
            "/api/v1/queue/join",
            json!({ "user_id": user, "point_id": point_id }),
        )
        .await;
    }

    let (_, before) = get(&app.router, "/api/v1/users/bob/tickets").await;
    assert_eq!(before["data"][0]["position"], 2);
    assert_eq!(before["data"][0]["name"], "T-City");
    assert_eq!(before["data"][0]["within_sla"], true);

    post_json(
        &app.router,
        "/api/v1/queue/leave",
        json!({ "user_id": "alice", "point_id": point_id }),
    )
    .await;

    let (status, after) = get(&app.router, "/api/v1/users/bob/tickets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["data"][0]["position"], 1);
    assert_eq!(after["data"][0]["eta_minutes"], 1);
}

#[tokio::test]
async fn user_without_tickets_gets_empty_list() {
    let app = build_test_app();

    let (status, json) = get(&app.router, "/api/v1/users/nobody/tickets").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));
}
