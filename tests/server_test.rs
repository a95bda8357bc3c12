//! End-to-end tests of the local queue service: submission, lifecycle
//! transitions, synchronous runs, auth, and the status wire shape

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{png_b64, StubEngine};
use edit_serving::server::{create_router, queue::JobQueue, ServerState};
use edit_serving::worker::JobHandler;

fn test_app(api_keys: Vec<String>) -> Router {
    let handler = JobHandler::new(Arc::new(StubEngine::default()));
    let state = Arc::new(ServerState {
        queue: JobQueue::new(handler),
    });
    create_router(state, api_keys)
}

async fn request_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn submission(input: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/json")
        .body(Body::from(json!({"input": input}).to_string()))
        .unwrap()
}

async fn wait_for_terminal(app: &Router, id: &str) -> Value {
    for _ in 0..50 {
        let status_request = Request::builder()
            .uri(format!("/status/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = request_json(app, status_request).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "COMPLETED" || body["status"] == "FAILED" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {id} never reached a terminal status");
}

#[tokio::test]
async fn submitted_job_completes_with_scalar_output() {
    let app = test_app(vec![]);

    let (status, body) = request_json(
        &app,
        submission(json!({"image": png_b64(), "prompt": "make the sky purple"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let terminal = wait_for_terminal(&app, &id).await;
    assert_eq!(terminal["status"], "COMPLETED");
    assert!(terminal["output"]["image"].is_string());
}

#[tokio::test]
async fn invalid_job_fails_with_an_envelope() {
    let app = test_app(vec![]);

    let (status, body) = request_json(&app, submission(json!({"prompt": "x"}))).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_str().unwrap().to_string();

    let terminal = wait_for_terminal(&app, &id).await;
    assert_eq!(terminal["status"], "FAILED");
    assert_eq!(terminal["output"]["kind"], "MissingInput");
    assert!(terminal["output"]["error"].is_string());
}

#[tokio::test]
async fn runsync_returns_the_terminal_output_in_one_call() {
    let app = test_app(vec![]);

    let request = Request::builder()
        .method("POST")
        .uri("/runsync")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"input": {"images": [png_b64(), png_b64()], "prompt": "merge"}}).to_string(),
        ))
        .unwrap();

    let (status, body) = request_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert!(body["output"]["images"].is_array());
}

#[tokio::test]
async fn unknown_job_id_is_not_found() {
    let app = test_app(vec![]);

    let request = Request::builder()
        .uri("/status/not-a-job")
        .body(Body::empty())
        .unwrap();
    let (status, _) = request_json(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri(format!("/status/{}", uuid::Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let (status, _) = request_json(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn job_routes_require_a_configured_api_key() {
    let app = test_app(vec!["valid-key".to_string()]);

    let (status, _) = request_json(&app, submission(json!({"prompt": "x"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/json")
        .header(AUTHORIZATION, "Bearer wrong-key")
        .body(Body::from(json!({"input": {}}).to_string()))
        .unwrap();
    let (status, _) = request_json(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/json")
        .header(AUTHORIZATION, "Bearer valid-key")
        .body(Body::from(
            json!({"input": {"image": png_b64(), "prompt": "x"}}).to_string(),
        ))
        .unwrap();
    let (status, _) = request_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_endpoint_bypasses_auth() {
    let app = test_app(vec!["valid-key".to_string()]);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = request_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
