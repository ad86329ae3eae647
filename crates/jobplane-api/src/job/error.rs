//! Job lifecycle errors.

use serde::Serialize;
use thiserror::Error;

use jobplane_protocols::error::{CatalogError, EngineError};

/// Coarse classification of a [`LifecycleError`] for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input or a duplicate; fix the request.
    Validation,
    NotFound,
    /// The store or engine failed; nothing about the request was wrong.
    Infrastructure,
    /// The catalog changed but the live engine did not follow.
    Partial,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    #[error("Unknown job type: {0}")]
    UnresolvableType(String),

    #[error("Invalid cron expression: {0}")]
    InvalidSchedule(String),

    #[error("Invalid job: {0}")]
    InvalidInput(String),

    /// The live engine rejected or failed an operation; nothing was persisted.
    #[error("Scheduler engine error: {0}")]
    Engine(#[from] EngineError),

    /// The catalog write succeeded but the live engine step failed or was skipped.
    #[error("Job {id} saved, but the scheduler was not updated: {reason}")]
    PartialSuccess { id: i64, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::NotFound(_) => ErrorKind::NotFound,
            LifecycleError::AlreadyExists(_)
            | LifecycleError::UnresolvableType(_)
            | LifecycleError::InvalidSchedule(_)
            | LifecycleError::InvalidInput(_) => ErrorKind::Validation,
            LifecycleError::Engine(_) | LifecycleError::Catalog(_) => ErrorKind::Infrastructure,
            LifecycleError::PartialSuccess { .. } => ErrorKind::Partial,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, LifecycleError::PartialSuccess { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            LifecycleError::AlreadyExists("a".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LifecycleError::UnresolvableType("x.Y".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LifecycleError::InvalidSchedule("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LifecycleError::InvalidInput("job_name must not be empty".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(LifecycleError::NotFound("7".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            LifecycleError::Engine(EngineError::ShutDown).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            LifecycleError::Catalog(CatalogError::StorageError("disk".into())).kind(),
            ErrorKind::Infrastructure
        );
        let partial = LifecycleError::PartialSuccess {
            id: 3,
            reason: "engine down".into(),
        };
        assert_eq!(partial.kind(), ErrorKind::Partial);
        assert!(partial.is_partial());
    }

    #[test]
    fn test_partial_success_display() {
        let err = LifecycleError::PartialSuccess {
            id: 12,
            reason: "not registered".into(),
        };
        let display = err.to_string();
        assert!(display.contains("12"));
        assert!(display.contains("not registered"));
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::Infrastructure).unwrap();
        assert_eq!(json, "\"infrastructure\"");
    }
}
