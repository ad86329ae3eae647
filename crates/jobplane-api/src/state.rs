//! Application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::job::JobLifecycleService;

/// Application state shared across handlers.
pub struct AppState {
    pub service: Arc<JobLifecycleService>,
    start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<JobLifecycleService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }

    /// Get uptime.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
