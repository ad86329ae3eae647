//! Job lifecycle service.
//!
//! The only path that mutates the catalog or the live engine. Every mutation
//! writes the catalog first, then drives the engine, then records the row's
//! sync status. Mutations hold the service gate exclusively and listings
//! share it, so a listing never pairs an updated row with a stale trigger.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use jobplane_core::JobTypeRegistry;
use jobplane_engine::validate_cron_expression;
use jobplane_protocols::catalog::{JobCatalog, JobConfiguration, JobUpdate, NewJob, SyncStatus};
use jobplane_protocols::engine::SchedulerEngine;
use jobplane_protocols::error::{CatalogError, EngineError};
use jobplane_protocols::job::JobKey;

use super::error::LifecycleError;
use super::reconciler::{job_detail, ReconcileReport, Reconciler};
use super::view::JobScheduleView;

/// Result of a name-addressed control operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlOutcome {
    Applied,
    /// No live job has that name.
    NotFound,
}

/// A registered job type and its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobTypeInfo {
    pub job_type: String,
    pub description: String,
}

pub struct JobLifecycleService {
    catalog: Arc<dyn JobCatalog>,
    engine: Arc<dyn SchedulerEngine>,
    registry: Arc<JobTypeRegistry>,
    reconciler: Reconciler,
    gate: RwLock<()>,
}

impl JobLifecycleService {
    pub fn new(
        catalog: Arc<dyn JobCatalog>,
        engine: Arc<dyn SchedulerEngine>,
        registry: Arc<JobTypeRegistry>,
    ) -> Self {
        let reconciler = Reconciler::new(catalog.clone(), engine.clone(), registry.clone());
        Self {
            catalog,
            engine,
            registry,
            reconciler,
            gate: RwLock::new(()),
        }
    }

    pub fn engine(&self) -> &Arc<dyn SchedulerEngine> {
        &self.engine
    }

    /// Register the active catalog with the engine and start it.
    pub async fn load_catalog(&self) -> Result<ReconcileReport, LifecycleError> {
        let _guard = self.gate.write().await;
        self.reconciler.load_catalog().await
    }

    /// Run one drift-repair sweep.
    pub async fn reconcile(&self) -> Result<ReconcileReport, LifecycleError> {
        let _guard = self.gate.write().await;
        self.reconciler.sweep().await
    }

    /// Create a job and register it with the engine.
    ///
    /// Names are unique across groups. If the engine rejects the registration
    /// the row stays persisted as `Unregistered` and `PartialSuccess` is
    /// returned.
    pub async fn create_job(&self, job: NewJob) -> Result<JobConfiguration, LifecycleError> {
        let _guard = self.gate.write().await;

        if job.job_name.trim().is_empty() {
            return Err(LifecycleError::InvalidInput(
                "job_name must not be empty".to_string(),
            ));
        }
        if job.job_group.trim().is_empty() {
            return Err(LifecycleError::InvalidInput(
                "job_group must not be empty".to_string(),
            ));
        }
        if self.catalog.find_by_name(&job.job_name).await?.is_some() {
            return Err(LifecycleError::AlreadyExists(job.job_name));
        }
        if !self.registry.contains(&job.job_type) {
            return Err(LifecycleError::UnresolvableType(job.job_type));
        }
        validate_cron_expression(&job.cron_expression)
            .map_err(|e| LifecycleError::InvalidSchedule(e.to_string()))?;

        let key = job.key();
        let mut row = self.catalog.insert(job).await.map_err(|e| match e {
            CatalogError::Conflict(_) => LifecycleError::AlreadyExists(key.name.clone()),
            other => LifecycleError::Catalog(other),
        })?;
        info!(job = %key, id = row.id, "Created job '{}'", key);

        let registration = match job_detail(&self.registry, &row) {
            Ok(detail) => self
                .engine
                .register_job(detail, &row.cron_expression)
                .await
                .map_err(LifecycleError::from),
            Err(e) => Err(e),
        };

        match registration {
            Ok(()) => {
                self.record_status(&mut row, SyncStatus::Registered).await;
                Ok(row)
            }
            Err(e) => {
                warn!(job = %key, id = row.id, "Job persisted but not scheduled: {}", e);
                self.record_status(&mut row, SyncStatus::Unregistered).await;
                Err(LifecycleError::PartialSuccess {
                    id: row.id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Update a job's schedule, description, and payload.
    ///
    /// The live trigger is replaced in place only when the schedule changed.
    /// A changed payload is pushed to the live job so the next execution sees it.
    /// A job with no live trigger is saved and reported as `PartialSuccess`.
    pub async fn update_job(
        &self,
        id: i64,
        update: JobUpdate,
    ) -> Result<JobConfiguration, LifecycleError> {
        let _guard = self.gate.write().await;

        let mut row = self
            .active_row(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        validate_cron_expression(&update.cron_expression)
            .map_err(|e| LifecycleError::InvalidSchedule(e.to_string()))?;

        row.cron_expression = update.cron_expression;
        row.description = update.description;
        row.job_data = update.job_data;
        self.catalog.update(&row).await?;

        let key = row.key();
        info!(job = %key, id, "Updated job '{}'", key);

        let trigger = match self.engine.trigger(&key).await {
            Ok(trigger) => trigger,
            Err(e) => {
                self.record_status(&mut row, SyncStatus::OutOfSync).await;
                return Err(LifecycleError::PartialSuccess {
                    id,
                    reason: e.to_string(),
                });
            }
        };

        let Some(trigger) = trigger else {
            warn!(job = %key, id, "Updated job has no live trigger");
            self.record_status(&mut row, SyncStatus::Unregistered).await;
            return Err(LifecycleError::PartialSuccess {
                id,
                reason: format!("job '{}' is not registered with the scheduler", key),
            });
        };

        if trigger.cron_expression != row.cron_expression {
            if let Err(e) = self
                .engine
                .replace_trigger(&key, &row.cron_expression)
                .await
            {
                warn!(job = %key, id, "Failed to reschedule job: {}", e);
                self.record_status(&mut row, SyncStatus::OutOfSync).await;
                return Err(LifecycleError::PartialSuccess {
                    id,
                    reason: e.to_string(),
                });
            }
            info!(
                job = %key,
                "Rescheduled '{}' -> '{}'",
                trigger.cron_expression,
                row.cron_expression
            );
        }

        if let Err(e) = self.sync_payload(&key, &row.job_data).await {
            warn!(job = %key, id, "Failed to refresh job payload: {}", e);
            self.record_status(&mut row, SyncStatus::OutOfSync).await;
            return Err(LifecycleError::PartialSuccess {
                id,
                reason: e.to_string(),
            });
        }

        self.record_status(&mut row, SyncStatus::Registered).await;
        Ok(row)
    }

    /// Fire the named job once, now. Its schedule is not touched.
    pub async fn trigger_job(&self, name: &str) -> Result<(), LifecycleError> {
        let _guard = self.gate.write().await;
        let key = self
            .live_key(name)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(name.to_string()))?;
        self.engine.fire_now(&key).await?;
        info!(job = %key, "Triggered job '{}'", key);
        Ok(())
    }

    pub async fn pause_job(&self, name: &str) -> Result<ControlOutcome, LifecycleError> {
        let _guard = self.gate.write().await;
        let Some(key) = self.live_key(name).await? else {
            return Ok(ControlOutcome::NotFound);
        };
        self.engine.pause(&key).await?;
        info!(job = %key, "Paused job '{}'", key);
        Ok(ControlOutcome::Applied)
    }

    pub async fn resume_job(&self, name: &str) -> Result<ControlOutcome, LifecycleError> {
        let _guard = self.gate.write().await;
        let Some(key) = self.live_key(name).await? else {
            return Ok(ControlOutcome::NotFound);
        };
        self.engine.resume(&key).await?;
        info!(job = %key, "Resumed job '{}'", key);
        Ok(ControlOutcome::Applied)
    }

    /// Soft-delete a job and remove it from the engine.
    pub async fn delete_job(&self, id: i64) -> Result<(), LifecycleError> {
        let _guard = self.gate.write().await;

        let mut row = self
            .active_row(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        if !self.catalog.soft_delete(id).await? {
            return Err(LifecycleError::NotFound(id.to_string()));
        }

        let key = row.key();
        info!(job = %key, id, "Deleted job '{}'", key);

        match self.engine.unregister_job(&key).await {
            Ok(_) => {
                self.record_status(&mut row, SyncStatus::Unregistered).await;
                Ok(())
            }
            Err(e) => {
                warn!(job = %key, id, "Deleted job is still scheduled: {}", e);
                self.record_status(&mut row, SyncStatus::OutOfSync).await;
                Err(LifecycleError::PartialSuccess {
                    id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Every active job merged with its live trigger, ordered by id.
    pub async fn list_jobs(&self) -> Result<Vec<JobScheduleView>, LifecycleError> {
        let _guard = self.gate.read().await;
        let jobs = self.catalog.get_active().await?;

        let mut views = Vec::with_capacity(jobs.len());
        for job in jobs {
            let trigger = self.engine.trigger(&job.key()).await?;
            views.push(JobScheduleView::compose(job, trigger));
        }
        Ok(views)
    }

    /// One active job merged with its live trigger.
    pub async fn get_job(&self, id: i64) -> Result<JobScheduleView, LifecycleError> {
        let _guard = self.gate.read().await;
        let job = self
            .active_row(id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        let trigger = self.engine.trigger(&job.key()).await?;
        Ok(JobScheduleView::compose(job, trigger))
    }

    /// Recorded sync status of a row, soft-deleted rows included.
    pub async fn sync_status(&self, id: i64) -> Result<Option<SyncStatus>, LifecycleError> {
        Ok(self.catalog.get(id).await?.map(|row| row.sync_status))
    }

    /// Registered job type identifiers, sorted.
    pub fn list_job_types(&self) -> Vec<String> {
        self.registry.list_types()
    }

    pub fn describe_job_types(&self) -> Vec<JobTypeInfo> {
        self.registry
            .describe_types()
            .into_iter()
            .map(|(job_type, description)| JobTypeInfo {
                job_type,
                description,
            })
            .collect()
    }

    async fn active_row(&self, id: i64) -> Result<Option<JobConfiguration>, LifecycleError> {
        Ok(self.catalog.get(id).await?.filter(|row| !row.is_deleted))
    }

    /// First live key with this name, in any group.
    async fn live_key(&self, name: &str) -> Result<Option<JobKey>, LifecycleError> {
        Ok(self
            .engine
            .list_registered_keys()
            .await?
            .into_iter()
            .find(|key| key.name == name))
    }

    async fn sync_payload(&self, key: &JobKey, payload: &str) -> Result<(), EngineError> {
        if self.engine.payload(key).await?.as_deref() == Some(payload) {
            return Ok(());
        }
        self.engine.update_payload(key, payload).await
    }

    async fn record_status(&self, row: &mut JobConfiguration, status: SyncStatus) {
        match self.catalog.set_sync_status(row.id, status).await {
            Ok(()) => row.sync_status = status,
            Err(e) => warn!(
                job = %row.key(),
                id = row.id,
                "Failed to record sync status {}: {}",
                status,
                e
            ),
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
