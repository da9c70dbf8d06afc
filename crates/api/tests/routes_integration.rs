//! Route-level coverage over the real wiring: axum router, scheduling
//! service, approval gate, and SQLite store on a temporary database.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskbridge_api::{router, AppContext};
use taskbridge_domain::Config;
use tempfile::TempDir;
use tower::ServiceExt;

struct ApiHarness {
    #[allow(dead_code)]
    temp_dir: TempDir,
    app: Router,
}

async fn harness() -> ApiHarness {
    let temp_dir = TempDir::new().expect("temporary directory should be created");
    let mut config = Config::default();
    config.database.path =
        temp_dir.path().join("api.db").to_string_lossy().into_owned();
    config.database.pool_size = 2;

    let ctx = Arc::new(AppContext::new(config).await.expect("context wires up"));
    ApiHarness { temp_dir, app: router(ctx) }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .expect("request builds"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builds"),
    };

    let response = app.clone().oneshot(request).await.expect("request handled");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body read");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn draft(name: &str, start: &str, end: &str) -> Value {
    json!({ "name": name, "start_time": start, "end_time": end })
}

#[tokio::test(flavor = "multi_thread")]
async fn health_endpoint_reports_ok() {
    let h = harness().await;
    let (status, body) = send(&h.app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn create_list_and_blocking_conflict_flow() {
    let h = harness().await;

    let (status, _) = send(
        &h.app,
        Method::POST,
        "/api/users/u1",
        Some(json!({ "display_name": "Integration User" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/users/u1/tasks",
        Some(draft("meeting", "2026-03-02 09:00:00", "2026-03-02 10:00:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["name"], "meeting");

    // Overlap under the blocking flag is refused with a structured body
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/users/u1/tasks?blocking=true",
        Some(draft("clash", "2026-03-02 09:30:00", "2026-03-02 09:45:00")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["outcome"], "blocked");
    assert_eq!(body["conflicts"].as_array().map(Vec::len), Some(1));

    // Advisory default persists the same overlap with a warning attached
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/api/users/u1/tasks",
        Some(draft("clash", "2026-03-02 09:30:00", "2026-03-02 09:45:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conflicts"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(&h.app, Method::GET, "/api/users/u1/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn conflict_precheck_honors_the_boundary_policy() {
    let h = harness().await;
    send(&h.app, Method::POST, "/api/users/u1", Some(json!({}))).await;
    send(
        &h.app,
        Method::POST,
        "/api/users/u1/tasks",
        Some(draft("a", "2026-03-02 09:00:00", "2026-03-02 10:00:00")),
    )
    .await;

    // Touching endpoints: clear under the default exclusive policy
    let check = json!({ "start": "2026-03-02 10:00:00", "end": "2026-03-02 11:00:00" });
    let (status, body) =
        send(&h.app, Method::POST, "/api/users/u1/conflict-check", Some(check.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));

    // Switch to inclusive and the same candidate now conflicts
    let (status, _) = send(
        &h.app,
        Method::PUT,
        "/api/users/u1/boundary-policy",
        Some(json!({ "boundary_policy": "inclusive" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) =
        send(&h.app, Method::POST, "/api/users/u1/conflict-check", Some(check)).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn intent_ingress_queues_then_approval_creates() {
    let h = harness().await;
    send(&h.app, Method::POST, "/api/users/u1", Some(json!({}))).await;

    let intent = json!({
        "tool": "create_task",
        "draft": draft("seminar", "2026-03-04 14:00:00", "2026-03-04 15:00:00"),
        "source": "Fwd: seminar"
    });
    let (status, body) = send(&h.app, Method::POST, "/api/users/u1/intents", Some(intent)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "queued");
    let entry_id = body["entry_id"].as_str().expect("entry id present").to_string();

    // Nothing admitted yet; the entry is visible in the queue
    let (_, tasks) = send(&h.app, Method::GET, "/api/users/u1/tasks", None).await;
    assert_eq!(tasks.as_array().map(Vec::len), Some(0));
    let (_, queue) = send(&h.app, Method::GET, "/api/users/u1/queue", None).await;
    assert_eq!(queue.as_array().map(Vec::len), Some(1));

    // A foreign user may not approve it
    send(&h.app, Method::POST, "/api/users/intruder", Some(json!({}))).await;
    let (status, _) = send(
        &h.app,
        Method::POST,
        &format!("/api/users/intruder/queue/{entry_id}/approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner approves; the task appears and the queue drains
    let (status, body) = send(
        &h.app,
        Method::POST,
        &format!("/api/users/u1/queue/{entry_id}/approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["name"], "seminar");

    let (_, tasks) = send(&h.app, Method::GET, "/api/users/u1/tasks", None).await;
    assert_eq!(tasks.as_array().map(Vec::len), Some(1));
    let (_, queue) = send(&h.app, Method::GET, "/api/users/u1/queue", None).await;
    assert_eq!(queue.as_array().map(Vec::len), Some(0));

    // The whole flow left an audit trail
    let (_, logs) = send(&h.app, Method::GET, "/api/users/u1/logs", None).await;
    assert!(logs.as_array().map(Vec::len).unwrap_or(0) >= 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_a_404_and_sync_disabled_is_a_400() {
    let h = harness().await;
    send(&h.app, Method::POST, "/api/users/u1", Some(json!({}))).await;

    let (status, _) = send(&h.app, Method::GET, "/api/users/u1/tasks/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send(&h.app, Method::POST, "/api/users/u1/timetable/import", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
