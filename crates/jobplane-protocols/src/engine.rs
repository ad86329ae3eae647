//! Scheduling engine protocol definitions.
//!
//! The engine owns live trigger state: which job keys are registered, their
//! cron schedules, and when they fire next. The control plane never evaluates
//! cron expressions itself; it only drives the engine through this trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::job::{JobHandler, JobKey};

/// Live state of a job's trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerState {
    /// Scheduled and will fire.
    Normal,
    /// Scheduled but suppressed.
    Paused,
    /// Will not fire again.
    Complete,
    /// Suppressed after an execution panicked; cleared by resume.
    Error,
    /// Currently executing under the no-overlap policy.
    Blocked,
    /// The engine has no knowledge of this key.
    None,
}

impl TriggerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerState::Normal => "Normal",
            TriggerState::Paused => "Paused",
            TriggerState::Complete => "Complete",
            TriggerState::Error => "Error",
            TriggerState::Blocked => "Blocked",
            TriggerState::None => "None",
        }
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one live trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerInfo {
    pub key: JobKey,
    pub cron_expression: String,
    pub state: TriggerState,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    /// Incremented every time the trigger's schedule is replaced.
    pub revision: u64,
}

/// Everything the engine needs to run a job.
#[derive(Clone)]
pub struct JobDetail {
    pub key: JobKey,
    pub job_type: String,
    pub description: String,
    pub payload: String,
    pub handler: Arc<dyn JobHandler>,
}

impl fmt::Debug for JobDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobDetail")
            .field("key", &self.key)
            .field("job_type", &self.job_type)
            .field("description", &self.description)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// Live, in-process scheduling engine.
///
/// Every method maps to one atomic engine operation. Implementations must be
/// safe to call concurrently from request handlers while their own workers
/// are firing jobs.
#[async_trait]
pub trait SchedulerEngine: Send + Sync {
    /// Register a job with a cron trigger. Fails if the key is already registered.
    async fn register_job(&self, job: JobDetail, cron_expression: &str) -> Result<(), EngineError>;

    /// Remove a job and its trigger. Returns false if the key was not registered.
    async fn unregister_job(&self, key: &JobKey) -> Result<bool, EngineError>;

    /// Whether a job is registered under this key.
    async fn exists(&self, key: &JobKey) -> Result<bool, EngineError>;

    /// Swap the trigger's schedule in place, keeping its identity.
    async fn replace_trigger(&self, key: &JobKey, cron_expression: &str) -> Result<(), EngineError>;

    /// Payload handed to the job's next executions, or None for unknown keys.
    async fn payload(&self, key: &JobKey) -> Result<Option<String>, EngineError>;

    /// Swap the payload for later executions. The trigger is left untouched.
    async fn update_payload(&self, key: &JobKey, payload: &str) -> Result<(), EngineError>;

    /// Run the job once, immediately, without touching its schedule.
    async fn fire_now(&self, key: &JobKey) -> Result<(), EngineError>;

    async fn pause(&self, key: &JobKey) -> Result<(), EngineError>;

    async fn resume(&self, key: &JobKey) -> Result<(), EngineError>;

    /// Trigger state, `TriggerState::None` for unknown keys.
    async fn trigger_state(&self, key: &JobKey) -> Result<TriggerState, EngineError>;

    async fn next_fire_time(&self, key: &JobKey) -> Result<Option<DateTime<Utc>>, EngineError>;

    async fn previous_fire_time(&self, key: &JobKey)
        -> Result<Option<DateTime<Utc>>, EngineError>;

    /// Full trigger snapshot, or None for unknown keys.
    async fn trigger(&self, key: &JobKey) -> Result<Option<TriggerInfo>, EngineError>;

    async fn list_registered_keys(&self) -> Result<Vec<JobKey>, EngineError>;

    /// Start dispatching. Registered triggers do not fire before this.
    async fn start(&self) -> Result<(), EngineError>;

    /// Stop dispatching and signal in-flight executions to cancel.
    async fn shutdown(&self) -> Result<(), EngineError>;

    fn is_started(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_state_display() {
        assert_eq!(TriggerState::Normal.to_string(), "Normal");
        assert_eq!(TriggerState::None.to_string(), "None");
        assert_eq!(TriggerState::Blocked.as_str(), "Blocked");
    }

    #[test]
    fn test_trigger_state_serialization() {
        let json = serde_json::to_string(&TriggerState::Paused).unwrap();
        assert_eq!(json, "\"Paused\"");
        let state: TriggerState = serde_json::from_str("\"Complete\"").unwrap();
        assert_eq!(state, TriggerState::Complete);
    }

    #[test]
    fn test_trigger_info_serialization() {
        let info = TriggerInfo {
            key: JobKey::named("job"),
            cron_expression: "0 * * * * *".to_string(),
            state: TriggerState::Normal,
            next_fire_time: None,
            previous_fire_time: None,
            revision: 3,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["cron_expression"], "0 * * * * *");
        assert_eq!(json["revision"], 3);
        assert_eq!(json["key"]["name"], "job");
    }
}
