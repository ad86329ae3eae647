//! Built-in job types.
//!
//! Always registered so a fresh deployment has something to schedule.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use jobplane_protocols::error::JobError;
use jobplane_protocols::job::{JobContext, JobHandler};

use crate::register_job_type;

/// Does nothing. Useful for exercising schedules.
#[derive(Debug, Default)]
pub struct NoopJob;

#[async_trait]
impl JobHandler for NoopJob {
    fn job_type(&self) -> &str {
        "builtin.noop"
    }

    fn description(&self) -> &str {
        "Completes immediately without side effects"
    }

    async fn execute(&self, _ctx: JobContext) -> Result<(), JobError> {
        Ok(())
    }
}

register_job_type!(NoopJob);

/// Writes its payload to the log.
///
/// A JSON object payload with a `message` field logs that field; anything else
/// is logged verbatim.
#[derive(Debug, Default)]
pub struct LogJob;

impl LogJob {
    fn message(payload: &str) -> String {
        match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Object(map)) => match map.get("message") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => payload.to_string(),
            },
            _ => payload.to_string(),
        }
    }
}

#[async_trait]
impl JobHandler for LogJob {
    fn job_type(&self) -> &str {
        "builtin.log"
    }

    fn description(&self) -> &str {
        "Logs the job payload"
    }

    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        info!(job = %ctx.key, "{}", Self::message(&ctx.payload));
        Ok(())
    }
}

register_job_type!(LogJob);

/// Sleeps for the number of milliseconds in its payload.
///
/// Returns [`JobError::Cancelled`] if the engine cancels the execution first.
#[derive(Debug, Default)]
pub struct SleepJob;

impl SleepJob {
    fn duration(payload: &str) -> Result<Duration, JobError> {
        let trimmed = payload.trim();
        if trimmed.is_empty() {
            return Ok(Duration::ZERO);
        }
        trimmed
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| JobError::InvalidPayload(format!("expected milliseconds, got '{}': {}", trimmed, e)))
    }
}

#[async_trait]
impl JobHandler for SleepJob {
    fn job_type(&self) -> &str {
        "builtin.sleep"
    }

    fn description(&self) -> &str {
        "Sleeps for the payload's number of milliseconds"
    }

    async fn execute(&self, ctx: JobContext) -> Result<(), JobError> {
        let duration = Self::duration(&ctx.payload)?;
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = ctx.cancel.cancelled() => Err(JobError::Cancelled),
        }
    }
}

register_job_type!(SleepJob);

#[cfg(test)]
mod tests {
    use super::*;
    use jobplane_protocols::job::JobKey;
    use tokio_util::sync::CancellationToken;

    fn ctx(payload: &str) -> JobContext {
        JobContext::new(JobKey::named("builtin-test"), payload)
    }

    #[tokio::test]
    async fn test_noop() {
        assert!(NoopJob.execute(ctx("")).await.is_ok());
    }

    #[test]
    fn test_log_message_extraction() {
        assert_eq!(LogJob::message(r#"{"message":"hello"}"#), "hello");
        assert_eq!(LogJob::message(r#"{"message":42}"#), "42");
        assert_eq!(LogJob::message("plain text"), "plain text");
        assert_eq!(LogJob::message(r#"{"other":1}"#), r#"{"other":1}"#);
    }

    #[tokio::test]
    async fn test_log_job_succeeds() {
        assert!(LogJob.execute(ctx("hello")).await.is_ok());
    }

    #[test]
    fn test_sleep_duration_parsing() {
        assert_eq!(SleepJob::duration("250").unwrap(), Duration::from_millis(250));
        assert_eq!(SleepJob::duration("  ").unwrap(), Duration::ZERO);
        assert!(matches!(
            SleepJob::duration("soon"),
            Err(JobError::InvalidPayload(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_job_completes() {
        assert!(SleepJob.execute(ctx("1000")).await.is_ok());
    }

    #[tokio::test]
    async fn test_sleep_job_honors_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = SleepJob
            .execute(ctx("60000").with_cancel(cancel))
            .await;
        assert!(matches!(result, Err(JobError::Cancelled)));
    }
}
