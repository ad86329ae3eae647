//! Job HTTP route handlers.
//!
//! - GET    /jobs                     - List jobs with live state
//! - GET    /jobs/types               - List job types
//! - GET    /jobs/{id}                - Get job
//! - POST   /jobs                     - Create job
//! - PUT    /jobs/{id}                - Update schedule, description, payload
//! - DELETE /jobs/{id}                - Delete job
//! - POST   /jobs/name/{name}/trigger - Fire once now
//! - POST   /jobs/name/{name}/pause   - Pause trigger
//! - POST   /jobs/name/{name}/resume  - Resume trigger
//! - POST   /jobs/reconcile           - Run one reconciliation sweep

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use jobplane_protocols::catalog::{JobUpdate, NewJob, SyncStatus};

use super::error::{ErrorKind, LifecycleError};
use super::service::ControlOutcome;
use super::view::JobScheduleView;
use crate::state::AppState;

/// Response body for mutating calls.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            kind: None,
            id: None,
            sync_status: None,
        }
    }

    pub fn failure(error: &LifecycleError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            kind: Some(error.kind()),
            id: None,
            sync_status: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_sync_status(mut self, status: SyncStatus) -> Self {
        self.sync_status = Some(status);
        self
    }
}

/// Response for listing jobs.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub count: usize,
    pub jobs: Vec<JobScheduleView>,
}

fn status_code(error: &LifecycleError) -> StatusCode {
    match error {
        LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
        LifecycleError::AlreadyExists(_) => StatusCode::CONFLICT,
        LifecycleError::UnresolvableType(_)
        | LifecycleError::InvalidSchedule(_)
        | LifecycleError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LifecycleError::PartialSuccess { .. } => StatusCode::MULTI_STATUS,
        LifecycleError::Engine(_) | LifecycleError::Catalog(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Translate a lifecycle error, attaching the row's current sync status on
/// partial success.
async fn error_response(state: &AppState, error: LifecycleError) -> (StatusCode, Json<Value>) {
    let code = status_code(&error);
    if code == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Job operation failed: {}", error);
    }

    let mut body = ActionResponse::failure(&error);
    if let LifecycleError::PartialSuccess { id, .. } = error {
        body = body.with_id(id);
        if let Ok(Some(status)) = state.service.sync_status(id).await {
            body = body.with_sync_status(status);
        }
    }
    (code, Json(json!(body)))
}

/// List all jobs.
///
/// GET /jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.service.list_jobs().await {
        Ok(jobs) => {
            let count = jobs.len();
            (StatusCode::OK, Json(json!(JobListResponse { count, jobs })))
        }
        Err(e) => error_response(&state, e).await,
    }
}

/// List registered job types.
///
/// GET /jobs/types
pub async fn list_job_types(State(state): State<Arc<AppState>>) -> Json<Value> {
    let types = state.service.describe_job_types();
    Json(json!({
        "count": types.len(),
        "types": types,
    }))
}

/// Get a job by id.
///
/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    match state.service.get_job(id).await {
        Ok(job) => (StatusCode::OK, Json(json!({ "job": job }))),
        Err(e) => error_response(&state, e).await,
    }
}

/// Create a job.
///
/// POST /jobs
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewJob>,
) -> (StatusCode, Json<Value>) {
    info!(
        "Creating job: {} ({}, schedule: {})",
        request.job_name, request.job_type, request.cron_expression
    );

    match state.service.create_job(request).await {
        Ok(job) => (
            StatusCode::CREATED,
            Json(json!(ActionResponse::ok(format!(
                "Job '{}' created",
                job.job_name
            ))
            .with_id(job.id)
            .with_sync_status(job.sync_status))),
        ),
        Err(e) => error_response(&state, e).await,
    }
}

/// Update a job's schedule, description, and payload.
///
/// PUT /jobs/{id}
pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<JobUpdate>,
) -> (StatusCode, Json<Value>) {
    match state.service.update_job(id, request).await {
        Ok(job) => (
            StatusCode::OK,
            Json(json!(ActionResponse::ok(format!(
                "Job '{}' updated",
                job.job_name
            ))
            .with_id(job.id)
            .with_sync_status(job.sync_status))),
        ),
        Err(e) => error_response(&state, e).await,
    }
}

/// Delete a job.
///
/// DELETE /jobs/{id}
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    info!("Deleting job: {}", id);

    match state.service.delete_job(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!(ActionResponse::ok(format!("Job {} deleted", id)).with_id(id))),
        ),
        Err(e) => error_response(&state, e).await,
    }
}

/// Fire a job once, now.
///
/// POST /jobs/name/{name}/trigger
pub async fn trigger_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.service.trigger_job(&name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!(ActionResponse::ok(format!("Job '{}' triggered", name)))),
        ),
        Err(e) => error_response(&state, e).await,
    }
}

fn control_response(name: &str, verb: &str, outcome: ControlOutcome) -> (StatusCode, Json<Value>) {
    match outcome {
        ControlOutcome::Applied => (
            StatusCode::OK,
            Json(json!(ActionResponse::ok(format!("Job '{}' {}", name, verb)))),
        ),
        ControlOutcome::NotFound => {
            let error = LifecycleError::NotFound(name.to_string());
            (StatusCode::NOT_FOUND, Json(json!(ActionResponse::failure(&error))))
        }
    }
}

/// Pause a job's trigger.
///
/// POST /jobs/name/{name}/pause
pub async fn pause_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.service.pause_job(&name).await {
        Ok(outcome) => control_response(&name, "paused", outcome),
        Err(e) => error_response(&state, e).await,
    }
}

/// Resume a job's trigger.
///
/// POST /jobs/name/{name}/resume
pub async fn resume_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.service.resume_job(&name).await {
        Ok(outcome) => control_response(&name, "resumed", outcome),
        Err(e) => error_response(&state, e).await,
    }
}

/// Run one reconciliation sweep.
///
/// POST /jobs/reconcile
pub async fn reconcile(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.service.reconcile().await {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({
                "success": report.is_clean(),
                "report": report,
            })),
        ),
        Err(e) => error_response(&state, e).await,
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
