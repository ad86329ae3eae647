//! Engine configuration.

use std::time::Duration;

/// Configuration for [`CronEngine`](crate::CronEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often the dispatch loop looks for due triggers.
    pub tick_interval: Duration,

    /// How long shutdown waits for in-flight executions.
    pub shutdown_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}
