//! Scheduling engine errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Job not registered: {0}")]
    NotFound(String),

    #[error("Job already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    #[error("Scheduler is shut down")]
    ShutDown,

    #[error("Scheduler error: {0}")]
    Internal(String),
}
