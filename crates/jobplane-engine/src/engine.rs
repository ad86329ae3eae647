//! Cron scheduling engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use jobplane_core::execute_job;
use jobplane_protocols::engine::{JobDetail, SchedulerEngine, TriggerInfo, TriggerState};
use jobplane_protocols::error::{EngineError, JobError};
use jobplane_protocols::job::{JobContext, JobKey};

use crate::config::EngineConfig;
use crate::trigger::CronTrigger;

/// One registered job.
struct Registration {
    /// Distinguishes this registration from a later one under the same key.
    id: u64,
    detail: JobDetail,
    trigger: CronTrigger,
    in_flight: u32,
}

impl Registration {
    fn state(&self) -> TriggerState {
        if self.trigger.state == TriggerState::Normal && self.in_flight > 0 {
            TriggerState::Blocked
        } else {
            self.trigger.state
        }
    }
}

struct EngineInner {
    config: EngineConfig,
    registrations: RwLock<HashMap<JobKey, Registration>>,
    /// Manual fires requested before start.
    pending_fires: Mutex<Vec<JobKey>>,
    next_registration_id: AtomicU64,
    started: AtomicBool,
    shut_down: AtomicBool,
    cancel: CancellationToken,
    tracker: TaskTracker,
    dispatch_handle: Mutex<Option<JoinHandle<()>>>,
}

/// In-process cron engine.
///
/// Jobs do not overlap with themselves: while an execution of a key is in
/// flight its trigger reports `Blocked` and scheduled fire times that come due
/// are skipped. A panicking execution moves the trigger to `Error` until it is
/// resumed. Cloning is cheap and yields a handle to the same engine.
#[derive(Clone)]
pub struct CronEngine {
    inner: Arc<EngineInner>,
}

impl CronEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                registrations: RwLock::new(HashMap::new()),
                pending_fires: Mutex::new(Vec::new()),
                next_registration_id: AtomicU64::new(1),
                started: AtomicBool::new(false),
                shut_down: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                tracker: TaskTracker::new(),
                dispatch_handle: Mutex::new(None),
            }),
        }
    }

    /// Number of executions currently running.
    pub fn running_executions(&self) -> usize {
        self.inner.tracker.len()
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(EngineError::ShutDown);
        }
        Ok(())
    }
}

impl Default for CronEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl EngineInner {
    async fn run_dispatch_loop(self: Arc<Self>) {
        info!(
            "Cron engine started (tick interval: {:?})",
            self.config.tick_interval
        );

        let mut interval = time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.dispatch_due(Utc::now());
                }
                _ = self.cancel.cancelled() => {
                    info!("Cron engine dispatch loop stopping");
                    break;
                }
            }
        }
    }

    /// Fire every trigger due at `now`.
    fn dispatch_due(self: &Arc<Self>, now: DateTime<Utc>) {
        let mut due = Vec::new();
        {
            let mut registrations = self.registrations.write();
            for (key, registration) in registrations.iter_mut() {
                if !registration.trigger.is_due(now) {
                    continue;
                }
                let Some(scheduled_at) = registration.trigger.advance(now) else {
                    continue;
                };
                if registration.in_flight > 0 {
                    debug!(
                        "Skipping fire of '{}' scheduled for {}: previous execution still running",
                        key,
                        scheduled_at.to_rfc3339()
                    );
                    continue;
                }
                if registration.trigger.state == TriggerState::Complete {
                    debug!("Trigger for '{}' has no further fire times", key);
                }
                registration.in_flight += 1;
                due.push((registration.id, registration.detail.clone(), scheduled_at));
            }
        }

        for (registration_id, detail, scheduled_at) in due {
            self.spawn_execution(registration_id, detail, Some(scheduled_at));
        }
    }

    /// Run one execution of a registered job.
    ///
    /// The caller has already counted it in the registration's `in_flight`.
    fn spawn_execution(
        self: &Arc<Self>,
        registration_id: u64,
        detail: JobDetail,
        scheduled_at: Option<DateTime<Utc>>,
    ) {
        let mut ctx = JobContext::new(detail.key.clone(), detail.payload.clone())
            .with_manual(scheduled_at.is_none())
            .with_cancel(self.cancel.child_token());
        if let Some(at) = scheduled_at {
            ctx = ctx.with_scheduled_at(at);
        }

        let engine = Arc::clone(self);
        self.tracker.spawn(async move {
            let result = execute_job(detail.handler.clone(), ctx).await;
            engine.finish_execution(&detail.key, registration_id, result);
        });
    }

    fn finish_execution(&self, key: &JobKey, registration_id: u64, result: Result<(), JobError>) {
        let mut registrations = self.registrations.write();
        let Some(registration) = registrations.get_mut(key) else {
            return;
        };
        if registration.id != registration_id {
            return;
        }

        registration.in_flight = registration.in_flight.saturating_sub(1);
        if let Err(JobError::Panicked(_)) = result {
            if registration.trigger.state == TriggerState::Normal {
                warn!("Trigger for '{}' moved to Error after a panic", key);
                registration.trigger.state = TriggerState::Error;
            }
        }
    }

    /// Count a manual execution and return what to spawn.
    fn claim_manual(&self, key: &JobKey) -> Option<(u64, JobDetail)> {
        let mut registrations = self.registrations.write();
        let registration = registrations.get_mut(key)?;
        registration.in_flight += 1;
        Some((registration.id, registration.detail.clone()))
    }

    fn fire_manual(self: &Arc<Self>, key: &JobKey) -> Result<(), EngineError> {
        let (registration_id, detail) = self
            .claim_manual(key)
            .ok_or_else(|| EngineError::NotFound(key.to_string()))?;
        debug!("Manual fire of '{}'", key);
        self.spawn_execution(registration_id, detail, None);
        Ok(())
    }

    fn with_registration<T>(
        &self,
        key: &JobKey,
        f: impl FnOnce(&mut Registration) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut registrations = self.registrations.write();
        let registration = registrations
            .get_mut(key)
            .ok_or_else(|| EngineError::NotFound(key.to_string()))?;
        f(registration)
    }
}

#[async_trait]
impl SchedulerEngine for CronEngine {
    async fn register_job(&self, job: JobDetail, cron_expression: &str) -> Result<(), EngineError> {
        self.ensure_running()?;
        let trigger = CronTrigger::new(cron_expression, Utc::now())?;

        let mut registrations = self.inner.registrations.write();
        if registrations.contains_key(&job.key) {
            return Err(EngineError::AlreadyRegistered(job.key.to_string()));
        }

        info!(
            "Registered job '{}' ({}) with schedule '{}'",
            job.key, job.job_type, cron_expression
        );
        let key = job.key.clone();
        registrations.insert(
            key,
            Registration {
                id: self.inner.next_registration_id.fetch_add(1, Ordering::Relaxed),
                detail: job,
                trigger,
                in_flight: 0,
            },
        );
        Ok(())
    }

    async fn unregister_job(&self, key: &JobKey) -> Result<bool, EngineError> {
        let removed = self.inner.registrations.write().remove(key).is_some();
        self.inner.pending_fires.lock().retain(|pending| pending != key);
        if removed {
            info!("Unregistered job '{}'", key);
        }
        Ok(removed)
    }

    async fn exists(&self, key: &JobKey) -> Result<bool, EngineError> {
        Ok(self.inner.registrations.read().contains_key(key))
    }

    async fn replace_trigger(&self, key: &JobKey, cron_expression: &str) -> Result<(), EngineError> {
        self.ensure_running()?;
        self.inner.with_registration(key, |registration| {
            registration.trigger.replace(cron_expression, Utc::now())?;
            info!(
                "Replaced trigger for '{}' with '{}' (revision {})",
                key,
                cron_expression,
                registration.trigger.revision()
            );
            Ok(())
        })
    }

    async fn payload(&self, key: &JobKey) -> Result<Option<String>, EngineError> {
        Ok(self
            .inner
            .registrations
            .read()
            .get(key)
            .map(|r| r.detail.payload.clone()))
    }

    async fn update_payload(&self, key: &JobKey, payload: &str) -> Result<(), EngineError> {
        self.inner.with_registration(key, |registration| {
            registration.detail.payload = payload.to_string();
            info!("Updated payload for '{}'", key);
            Ok(())
        })
    }

    async fn fire_now(&self, key: &JobKey) -> Result<(), EngineError> {
        self.ensure_running()?;
        if self.inner.started.load(Ordering::SeqCst) {
            return self.inner.fire_manual(key);
        }

        if !self.inner.registrations.read().contains_key(key) {
            return Err(EngineError::NotFound(key.to_string()));
        }
        debug!("Engine not started, queueing manual fire of '{}'", key);
        self.inner.pending_fires.lock().push(key.clone());
        Ok(())
    }

    async fn pause(&self, key: &JobKey) -> Result<(), EngineError> {
        self.inner.with_registration(key, |registration| {
            registration.trigger.pause();
            info!("Paused trigger for '{}'", key);
            Ok(())
        })
    }

    async fn resume(&self, key: &JobKey) -> Result<(), EngineError> {
        self.inner.with_registration(key, |registration| {
            registration.trigger.resume(Utc::now());
            info!("Resumed trigger for '{}'", key);
            Ok(())
        })
    }

    async fn trigger_state(&self, key: &JobKey) -> Result<TriggerState, EngineError> {
        Ok(self
            .inner
            .registrations
            .read()
            .get(key)
            .map(Registration::state)
            .unwrap_or(TriggerState::None))
    }

    async fn next_fire_time(&self, key: &JobKey) -> Result<Option<DateTime<Utc>>, EngineError> {
        Ok(self
            .inner
            .registrations
            .read()
            .get(key)
            .and_then(|r| r.trigger.next_fire_time))
    }

    async fn previous_fire_time(
        &self,
        key: &JobKey,
    ) -> Result<Option<DateTime<Utc>>, EngineError> {
        Ok(self
            .inner
            .registrations
            .read()
            .get(key)
            .and_then(|r| r.trigger.previous_fire_time))
    }

    async fn trigger(&self, key: &JobKey) -> Result<Option<TriggerInfo>, EngineError> {
        Ok(self
            .inner
            .registrations
            .read()
            .get(key)
            .map(|r| r.trigger.info(key, r.state())))
    }

    async fn list_registered_keys(&self) -> Result<Vec<JobKey>, EngineError> {
        let mut keys: Vec<JobKey> = self.inner.registrations.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn start(&self) -> Result<(), EngineError> {
        self.ensure_running()?;
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let handle = tokio::spawn(Arc::clone(&self.inner).run_dispatch_loop());
        *self.inner.dispatch_handle.lock() = Some(handle);

        let pending: Vec<JobKey> = std::mem::take(&mut *self.inner.pending_fires.lock());
        for key in pending {
            if let Err(e) = self.inner.fire_manual(&key) {
                warn!("Dropping queued manual fire of '{}': {}", key, e);
            }
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!("Cron engine shutting down");
        self.inner.cancel.cancel();

        let handle = self.inner.dispatch_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Dispatch loop ended abnormally: {}", e);
            }
        }

        self.inner.tracker.close();
        let timeout = self.inner.config.shutdown_timeout;
        if time::timeout(timeout, self.inner.tracker.wait()).await.is_err() {
            warn!(
                "{} executions still running after {:?}",
                self.inner.tracker.len(),
                timeout
            );
        }
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst) && !self.inner.shut_down.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
