//! HTTP API tests.
//!
//! Drive the full router in-process and check status codes and JSON shapes.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use reviewer_assign::db;
use reviewer_assign::services::review_service::DEFAULT_REQUEST_TIMEOUT;
use reviewer_assign::services::server::build_router;
use reviewer_assign::services::ReviewService;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

async fn setup() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("api.db")).await.unwrap();
    let service = ReviewService::new(pool, DEFAULT_REQUEST_TIMEOUT);
    (dir, build_router(service))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn add_backend_team(app: &Router) {
    let (status, _) = post(
        app,
        "/team/add",
        json!({
            "team_name": "backend",
            "members": [
                { "user_id": "u1", "username": "Alice", "is_active": true },
                { "user_id": "u2", "username": "Bob", "is_active": true },
                { "user_id": "u3", "username": "Carol", "is_active": true }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = setup().await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_team_add_and_get() {
    let (_dir, app) = setup().await;
    add_backend_team(&app).await;

    let (status, body) = get(&app, "/team/get?team_name=backend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_name"], "backend");
    assert_eq!(body["members"].as_array().unwrap().len(), 3);
    assert_eq!(body["members"][0]["user_id"], "u1");

    let (status, body) = post(
        &app,
        "/team/add",
        json!({ "team_name": "backend", "members": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "TEAM_EXISTS");

    let (status, body) = get(&app, "/team/get?team_name=frontend").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_set_is_active() {
    let (_dir, app) = setup().await;
    add_backend_team(&app).await;

    let (status, body) = post(
        &app,
        "/users/setIsActive",
        json!({ "user_id": "u2", "is_active": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "user": {
                "user_id": "u2",
                "username": "Bob",
                "team_name": "backend",
                "is_active": false
            }
        })
    );

    let (status, body) = post(
        &app,
        "/users/setIsActive",
        json!({ "user_id": "ghost", "is_active": true }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_pull_request_lifecycle() {
    let (_dir, app) = setup().await;
    add_backend_team(&app).await;

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({
            "pull_request_id": "pr-1",
            "pull_request_name": "Add search",
            "author_id": "u1"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pr"]["status"], "OPEN");
    assert_eq!(body["pr"]["author_id"], "u1");
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2", "u3"]));
    assert!(body["pr"]["createdAt"].is_string());
    assert!(body["pr"].get("mergedAt").is_none());

    let (status, body) = get(&app, "/users/getReview?user_id=u2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u2");
    assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");
    assert_eq!(body["pull_requests"][0]["status"], "OPEN");

    // Every other team member already reviews the PR
    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr-1", "old_user_id": "u2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NO_CANDIDATE");

    let (status, body) = post(
        &app,
        "/pullRequest/merge",
        json!({ "pull_request_id": "pr-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr"]["status"], "MERGED");
    assert!(body["pr"]["mergedAt"].is_string());

    let (status, body) = post(
        &app,
        "/pullRequest/merge",
        json!({ "pull_request_id": "pr-1" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr-1", "old_user_id": "u2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_MERGED");
}

#[tokio::test]
async fn test_reassign_replaces_reviewer() {
    let (_dir, app) = setup().await;
    add_backend_team(&app).await;
    post(
        &app,
        "/users/setIsActive",
        json!({ "user_id": "u3", "is_active": false }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({ "pull_request_id": "pr-1", "pull_request_name": "Fix", "author_id": "u1" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2"]));

    post(
        &app,
        "/users/setIsActive",
        json!({ "user_id": "u3", "is_active": true }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr-1", "old_user_id": "u2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["replaced_by"], "u3");
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["u3"]));

    let (status, body) = post(
        &app,
        "/pullRequest/reassign",
        json!({ "pull_request_id": "pr-1", "old_user_id": "u2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "NOT_ASSIGNED");
}

#[tokio::test]
async fn test_create_conflicts() {
    let (_dir, app) = setup().await;
    add_backend_team(&app).await;

    let pr = json!({ "pull_request_id": "pr-1", "pull_request_name": "X", "author_id": "u1" });
    let (status, _) = post(&app, "/pullRequest/create", pr.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(&app, "/pullRequest/create", pr).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "PR_EXISTS");

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({ "pull_request_id": "pr-2", "pull_request_name": "Y", "author_id": "ghost" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_invalid_input() {
    let (_dir, app) = setup().await;

    let (status, body) = post(
        &app,
        "/pullRequest/create",
        json!({ "pull_request_id": " ", "pull_request_name": "X", "author_id": "u1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = post(&app, "/pullRequest/merge", json!({ "id": "pr-1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let (status, body) = get(&app, "/team/get").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");

    let request = Request::builder()
        .uri("/users/getReview?user_id=u1")
        .header("x-request-timeout-ms", "soon")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_deadline_header_is_accepted() {
    let (_dir, app) = setup().await;

    let request = Request::builder()
        .uri("/users/getReview?user_id=u1")
        .header("x-request-timeout-ms", "2000")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user_id": "u1", "pull_requests": [] }));
}
