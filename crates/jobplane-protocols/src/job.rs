//! Job protocol definitions.
//!
//! A job is an executable unit registered under a stable type identifier.
//! The scheduling engine invokes it with a [`JobContext`] every time its
//! trigger fires.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::JobError;

/// Group used when a job is created without one.
pub const DEFAULT_GROUP: &str = "DEFAULT";

/// Identity of a schedulable unit: `(name, group)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub name: String,
    pub group: String,
}

impl JobKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
        }
    }

    /// Key in the default group.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_GROUP)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Context handed to a job for one execution.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Key of the job being executed.
    pub key: JobKey,

    /// Opaque payload stored with the job configuration.
    pub payload: String,

    /// Unique id of this execution.
    pub fire_instance_id: Uuid,

    /// Fire time the trigger was scheduled for (None for manual fires).
    pub scheduled_at: Option<DateTime<Utc>>,

    /// Actual time the execution started.
    pub fired_at: DateTime<Utc>,

    /// Whether this execution was requested manually rather than by the schedule.
    pub manual: bool,

    /// Cancellation signal forwarded from the engine.
    pub cancel: CancellationToken,
}

impl JobContext {
    pub fn new(key: JobKey, payload: impl Into<String>) -> Self {
        Self {
            key,
            payload: payload.into(),
            fire_instance_id: Uuid::new_v4(),
            scheduled_at: None,
            fired_at: Utc::now(),
            manual: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_scheduled_at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }

    pub fn with_manual(mut self, manual: bool) -> Self {
        self.manual = manual;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Core trait for job implementations.
///
/// Implementations are registered under [`JobHandler::job_type`] and resolved
/// by that identifier when a catalog row is scheduled.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Stable type identifier, e.g. `builtin.log`.
    fn job_type(&self) -> &str;

    /// Human readable description shown in job type listings.
    fn description(&self) -> &str {
        ""
    }

    /// Run the job once.
    async fn execute(&self, ctx: JobContext) -> Result<(), JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoJob;

    #[async_trait]
    impl JobHandler for EchoJob {
        fn job_type(&self) -> &str {
            "test.echo"
        }

        async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
            if ctx.payload.is_empty() {
                return Err(JobError::InvalidPayload("empty".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_job_key_display() {
        let key = JobKey::new("nightly", "reports");
        assert_eq!(key.to_string(), "reports.nightly");
    }

    #[test]
    fn test_job_key_named_uses_default_group() {
        let key = JobKey::named("cleanup");
        assert_eq!(key.group, DEFAULT_GROUP);
    }

    #[test]
    fn test_job_key_ordering() {
        let mut keys = vec![JobKey::new("b", "g"), JobKey::new("a", "g"), JobKey::new("z", "a")];
        keys.sort();
        assert_eq!(keys[0], JobKey::new("z", "a"));
        assert_eq!(keys[1], JobKey::new("a", "g"));
    }

    #[test]
    fn test_context_builders() {
        let now = Utc::now();
        let ctx = JobContext::new(JobKey::named("job"), "data")
            .with_scheduled_at(now)
            .with_manual(true);
        assert_eq!(ctx.scheduled_at, Some(now));
        assert!(ctx.manual);
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_context_cancel() {
        let token = CancellationToken::new();
        let ctx = JobContext::new(JobKey::named("job"), "").with_cancel(token.clone());
        token.cancel();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_handler_execute() {
        let job = EchoJob;
        assert_eq!(job.job_type(), "test.echo");
        assert_eq!(job.description(), "");
        assert!(job.execute(JobContext::new(JobKey::named("e"), "x")).await.is_ok());
        assert!(job.execute(JobContext::new(JobKey::named("e"), "")).await.is_err());
    }
}
