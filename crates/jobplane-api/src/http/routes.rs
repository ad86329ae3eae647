//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::monitoring;
use crate::job::routes as job_routes;
use crate::state::AppState;

/// Create the main router.
///
/// ## Route Structure
///
/// ```text
/// /jobs
///   GET    /jobs                     - List jobs with live state
///   POST   /jobs                     - Create job
///   GET    /jobs/types               - List job types
///   POST   /jobs/reconcile           - Run one reconciliation sweep
///   GET    /jobs/{id}                - Get job
///   PUT    /jobs/{id}                - Update job
///   DELETE /jobs/{id}                - Delete job
///   POST   /jobs/name/{name}/trigger - Fire once now
///   POST   /jobs/name/{name}/pause   - Pause trigger
///   POST   /jobs/name/{name}/resume  - Resume trigger
///
/// /health - Detailed health check
/// /livez  - Liveness probe
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let job_router = Router::new()
        .route("/", get(job_routes::list_jobs).post(job_routes::create_job))
        .route("/types", get(job_routes::list_job_types))
        .route("/reconcile", post(job_routes::reconcile))
        .route(
            "/{id}",
            get(job_routes::get_job)
                .put(job_routes::update_job)
                .delete(job_routes::delete_job),
        )
        .route("/name/{name}/trigger", post(job_routes::trigger_job))
        .route("/name/{name}/pause", post(job_routes::pause_job))
        .route("/name/{name}/resume", post(job_routes::resume_job))
        .with_state(state.clone());

    let monitoring_routes = Router::new()
        .route("/health", get(monitoring::health_check_detailed))
        .with_state(state);

    // Liveness probe has no state dependency
    let liveness_route = Router::new().route("/livez", get(monitoring::liveness_probe));

    Router::new()
        .nest("/jobs", job_router)
        .merge(monitoring_routes)
        .merge(liveness_route)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
