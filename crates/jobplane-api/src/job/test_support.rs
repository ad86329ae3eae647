//! Shared fixtures for control-plane tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jobplane_core::builtin::{LogJob, NoopJob, SleepJob};
use jobplane_core::JobTypeRegistry;
use jobplane_engine::{CronEngine, EngineConfig};
use jobplane_protocols::catalog::JobCatalog;
use jobplane_protocols::engine::{JobDetail, SchedulerEngine, TriggerInfo, TriggerState};
use jobplane_protocols::error::EngineError;
use jobplane_protocols::job::JobKey;

use super::service::JobLifecycleService;

/// Registry holding the built-in job types only.
pub(crate) fn registry() -> Arc<JobTypeRegistry> {
    let registry = JobTypeRegistry::new();
    registry.register(Arc::new(NoopJob)).unwrap();
    registry.register(Arc::new(LogJob)).unwrap();
    registry.register(Arc::new(SleepJob)).unwrap();
    Arc::new(registry)
}

pub(crate) fn service_with(
    catalog: Arc<dyn JobCatalog>,
    engine: Arc<dyn SchedulerEngine>,
) -> JobLifecycleService {
    JobLifecycleService::new(catalog, engine, registry())
}

/// A real [`CronEngine`] whose mutating calls can be made to fail.
pub(crate) struct TestEngine {
    inner: CronEngine,
    pub fail_register: AtomicBool,
    pub fail_replace: AtomicBool,
    pub fail_unregister: AtomicBool,
    pub fail_payload: AtomicBool,
}

impl TestEngine {
    pub fn new() -> Self {
        Self {
            inner: CronEngine::new(
                EngineConfig::default()
                    .with_tick_interval(Duration::from_millis(20))
                    .with_shutdown_timeout(Duration::from_secs(1)),
            ),
            fail_register: AtomicBool::new(false),
            fail_replace: AtomicBool::new(false),
            fail_unregister: AtomicBool::new(false),
            fail_payload: AtomicBool::new(false),
        }
    }

    fn injected(flag: &AtomicBool) -> Result<(), EngineError> {
        if flag.load(Ordering::SeqCst) {
            return Err(EngineError::Internal("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulerEngine for TestEngine {
    async fn register_job(&self, job: JobDetail, cron_expression: &str) -> Result<(), EngineError> {
        Self::injected(&self.fail_register)?;
        self.inner.register_job(job, cron_expression).await
    }

    async fn unregister_job(&self, key: &JobKey) -> Result<bool, EngineError> {
        Self::injected(&self.fail_unregister)?;
        self.inner.unregister_job(key).await
    }

    async fn exists(&self, key: &JobKey) -> Result<bool, EngineError> {
        self.inner.exists(key).await
    }

    async fn replace_trigger(&self, key: &JobKey, cron_expression: &str) -> Result<(), EngineError> {
        Self::injected(&self.fail_replace)?;
        self.inner.replace_trigger(key, cron_expression).await
    }

    async fn payload(&self, key: &JobKey) -> Result<Option<String>, EngineError> {
        self.inner.payload(key).await
    }

    async fn update_payload(&self, key: &JobKey, payload: &str) -> Result<(), EngineError> {
        Self::injected(&self.fail_payload)?;
        self.inner.update_payload(key, payload).await
    }

    async fn fire_now(&self, key: &JobKey) -> Result<(), EngineError> {
        self.inner.fire_now(key).await
    }

    async fn pause(&self, key: &JobKey) -> Result<(), EngineError> {
        self.inner.pause(key).await
    }

    async fn resume(&self, key: &JobKey) -> Result<(), EngineError> {
        self.inner.resume(key).await
    }

    async fn trigger_state(&self, key: &JobKey) -> Result<TriggerState, EngineError> {
        self.inner.trigger_state(key).await
    }

    async fn next_fire_time(&self, key: &JobKey) -> Result<Option<DateTime<Utc>>, EngineError> {
        self.inner.next_fire_time(key).await
    }

    async fn previous_fire_time(
        &self,
        key: &JobKey,
    ) -> Result<Option<DateTime<Utc>>, EngineError> {
        self.inner.previous_fire_time(key).await
    }

    async fn trigger(&self, key: &JobKey) -> Result<Option<TriggerInfo>, EngineError> {
        self.inner.trigger(key).await
    }

    async fn list_registered_keys(&self) -> Result<Vec<JobKey>, EngineError> {
        self.inner.list_registered_keys().await
    }

    async fn start(&self) -> Result<(), EngineError> {
        self.inner.start().await
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.inner.shutdown().await
    }

    fn is_started(&self) -> bool {
        self.inner.is_started()
    }
}
