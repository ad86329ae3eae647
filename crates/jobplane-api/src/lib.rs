//! # jobplane API
//!
//! Control plane for scheduled jobs:
//! - **Job**: lifecycle service, reconciler, and periodic drift sweep
//! - **HTTP**: REST endpoints for job management and health checks
//!
//! ## Architecture
//!
//! ```text
//!   HTTP (axum) ──► JobLifecycleService ──┬──► JobCatalog (durable rows)
//!                        │                └──► SchedulerEngine (live triggers)
//!                        ▼
//!                    Reconciler (startup load, drift sweep)
//! ```
//!
//! Every mutation writes the catalog first, then drives the engine, then
//! records the row's `SyncStatus`.

pub mod http;
pub mod job;
pub mod server;
pub mod state;

pub use http::routes::create_router;
pub use job::{
    spawn_sweep, ControlOutcome, ErrorKind, JobLifecycleService, JobScheduleView, JobTypeInfo,
    LifecycleError, ReconcileReport, Reconciler,
};
pub use server::{ApiConfig, ApiServer};
pub use state::AppState;
