//! Local queue service exposing the job wire contract
//!
//! `POST /run` accepts `{"input": <raw payload>}` and answers `{"id": ...}`;
//! `GET /status/:id` reports the lifecycle state with the terminal output
//! once available; `POST /runsync` submits and blocks in one call. This is
//! the same contract the hosted queue exposes, served by the in-process
//! worker.

pub mod queue;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::job::{JobStatus, JobSubmission, StatusResponse, SubmitResponse};
use crate::middleware::auth::AuthLayer;
use self::queue::JobQueue;

/// State shared across all routes
pub struct ServerState {
    pub queue: JobQueue,
}

/// Build the job service router
pub fn create_router(state: Arc<ServerState>, api_keys: Vec<String>) -> Router {
    Router::new()
        .route("/run", post(run_job))
        .route("/runsync", post(run_job_sync))
        .route("/status/:id", get(job_status))
        .route("/health", get(health))
        .layer(AuthLayer::new(api_keys))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn run_job(
    State(state): State<Arc<ServerState>>,
    Json(submission): Json<JobSubmission>,
) -> Result<Json<SubmitResponse>> {
    let id = state.queue.submit(submission.input)?;
    Ok(Json(SubmitResponse { id: id.to_string() }))
}

async fn run_job_sync(
    State(state): State<Arc<ServerState>>,
    Json(submission): Json<JobSubmission>,
) -> Result<Json<StatusResponse>> {
    let (id, output) = state.queue.submit_and_wait(submission.input).await?;
    let status = if output.is_error() {
        JobStatus::Failed
    } else {
        JobStatus::Completed
    };
    Ok(Json(StatusResponse {
        id: id.to_string(),
        status,
        output: Some(output),
    }))
}

async fn job_status(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let job_id = Uuid::parse_str(&id).map_err(|_| AppError::JobNotFound(id.clone()))?;
    let record = state
        .queue
        .get(&job_id)
        .ok_or_else(|| AppError::JobNotFound(id))?;

    Ok(Json(StatusResponse {
        id: record.id.to_string(),
        status: record.status,
        output: record.output,
    }))
}

async fn health(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "active_jobs": state.queue.active_count(),
    }))
}
