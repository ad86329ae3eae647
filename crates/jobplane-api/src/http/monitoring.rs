//! Monitoring and health check handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use jobplane_protocols::catalog::SyncStatus;
use jobplane_protocols::engine::TriggerState;

use crate::state::AppState;

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is healthy.
    Healthy,
    /// Service is degraded but functional.
    Degraded,
    /// Service is unhealthy.
    Unhealthy,
}

/// Job counts reported by the health check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    /// Active catalog rows.
    pub active: usize,
    /// Keys registered with the engine.
    pub registered: usize,
    pub paused: usize,
    /// Active rows not known to match the engine.
    pub out_of_sync: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Version information.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    pub engine_started: bool,
    pub jobs: JobCounts,
    /// Component health checks.
    pub components: Vec<ComponentHealth>,
}

/// Component health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name.
    pub name: String,
    /// Component status.
    pub status: HealthStatus,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    fn healthy(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Healthy,
            message: Some(message),
        }
    }

    fn with_status(name: &str, status: HealthStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message),
        }
    }
}

fn overall_status(components: &[ComponentHealth]) -> HealthStatus {
    if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if components.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Detailed health check.
///
/// The engine is unhealthy when it is not dispatching. The catalog is
/// degraded when any active row is not `Registered`.
pub async fn health_check_detailed(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engine = state.service.engine();
    let engine_started = engine.is_started();
    let mut counts = JobCounts::default();
    let mut components = Vec::with_capacity(2);

    match engine.list_registered_keys().await {
        Ok(keys) => counts.registered = keys.len(),
        Err(e) => components.push(ComponentHealth::with_status(
            "engine",
            HealthStatus::Unhealthy,
            e.to_string(),
        )),
    }
    if components.is_empty() {
        components.push(if engine_started {
            ComponentHealth::healthy("engine", format!("{} live triggers", counts.registered))
        } else {
            ComponentHealth::with_status(
                "engine",
                HealthStatus::Unhealthy,
                "engine is not started".to_string(),
            )
        });
    }

    match state.service.list_jobs().await {
        Ok(jobs) => {
            counts.active = jobs.len();
            counts.paused = jobs
                .iter()
                .filter(|job| job.trigger_state == TriggerState::Paused)
                .count();
            counts.out_of_sync = jobs
                .iter()
                .filter(|job| job.sync_status != SyncStatus::Registered)
                .count();

            let message = format!("{} active jobs", counts.active);
            components.push(if counts.out_of_sync > 0 {
                ComponentHealth::with_status(
                    "catalog",
                    HealthStatus::Degraded,
                    format!("{}, {} not registered", message, counts.out_of_sync),
                )
            } else {
                ComponentHealth::healthy("catalog", message)
            });
        }
        Err(e) => components.push(ComponentHealth::with_status(
            "catalog",
            HealthStatus::Unhealthy,
            e.to_string(),
        )),
    }

    Json(HealthResponse {
        status: overall_status(&components),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime().as_secs(),
        engine_started,
        jobs: counts,
        components,
    })
}

/// Liveness probe.
pub async fn liveness_probe() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive"
    }))
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;
