//! Job execution errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    #[error("Job execution was cancelled")]
    Cancelled,

    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Whether this failure came from a panic rather than a returned error.
    pub fn is_panic(&self) -> bool {
        matches!(self, JobError::Panicked(_))
    }
}
