//! Composite view of a catalog row and its live trigger.

use chrono::{DateTime, Utc};
use serde::Serialize;

use jobplane_protocols::catalog::{JobConfiguration, SyncStatus};
use jobplane_protocols::engine::{TriggerInfo, TriggerState};

/// A job as the control plane reports it: persisted fields plus live state.
///
/// Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobScheduleView {
    pub id: i64,
    pub job_name: String,
    pub job_group: String,
    pub job_type: String,
    /// Persisted schedule.
    pub cron_expression: String,
    pub description: String,
    pub job_data: String,
    pub sync_status: SyncStatus,
    pub trigger_state: TriggerState,
    /// Schedule the engine is actually running, if registered.
    pub live_cron_expression: Option<String>,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobScheduleView {
    pub fn compose(job: JobConfiguration, trigger: Option<TriggerInfo>) -> Self {
        let (trigger_state, live_cron_expression, next_fire_time, previous_fire_time) =
            match trigger {
                Some(info) => (
                    info.state,
                    Some(info.cron_expression),
                    info.next_fire_time,
                    info.previous_fire_time,
                ),
                None => (TriggerState::None, None, None, None),
            };

        Self {
            id: job.id,
            job_name: job.job_name,
            job_group: job.job_group,
            job_type: job.job_type,
            cron_expression: job.cron_expression,
            description: job.description,
            job_data: job.job_data,
            sync_status: job.sync_status,
            trigger_state,
            live_cron_expression,
            next_fire_time,
            previous_fire_time,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobplane_protocols::job::JobKey;

    fn row() -> JobConfiguration {
        let now = Utc::now();
        JobConfiguration {
            id: 1,
            job_name: "cleanup".to_string(),
            job_group: "DEFAULT".to_string(),
            job_type: "builtin.noop".to_string(),
            cron_expression: "0 0 * * * *".to_string(),
            description: String::new(),
            job_data: String::new(),
            is_deleted: false,
            sync_status: SyncStatus::Registered,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_compose_without_trigger() {
        let view = JobScheduleView::compose(row(), None);
        assert_eq!(view.trigger_state, TriggerState::None);
        assert!(view.next_fire_time.is_none());
        assert!(view.previous_fire_time.is_none());
        assert!(view.live_cron_expression.is_none());
    }

    #[test]
    fn test_compose_with_trigger() {
        let next = Utc::now();
        let info = TriggerInfo {
            key: JobKey::named("cleanup"),
            cron_expression: "0 0 * * * *".to_string(),
            state: TriggerState::Paused,
            next_fire_time: Some(next),
            previous_fire_time: None,
            revision: 0,
        };
        let view = JobScheduleView::compose(row(), Some(info));
        assert_eq!(view.trigger_state, TriggerState::Paused);
        assert_eq!(view.next_fire_time, Some(next));
        assert_eq!(view.live_cron_expression.as_deref(), Some("0 0 * * * *"));
    }

    #[test]
    fn test_view_serialization() {
        let json = serde_json::to_value(JobScheduleView::compose(row(), None)).unwrap();
        assert_eq!(json["job_name"], "cleanup");
        assert_eq!(json["trigger_state"], "None");
        assert_eq!(json["sync_status"], "Registered");
        assert!(json["next_fire_time"].is_null());
    }
}
