//! Catalog to engine reconciliation.
//!
//! [`Reconciler::load_catalog`] runs once at startup, registering every active
//! row before the engine starts dispatching. [`Reconciler::sweep`] repairs drift
//! afterwards. Both isolate failures per row: one bad row is logged and skipped,
//! never aborting the rest.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use jobplane_core::JobTypeRegistry;
use jobplane_protocols::catalog::{JobCatalog, JobConfiguration, SyncStatus};
use jobplane_protocols::engine::{JobDetail, SchedulerEngine, TriggerInfo};
use jobplane_protocols::job::JobKey;

use super::error::LifecycleError;

/// Outcome of a reconciliation pass.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileReport {
    /// Keys newly registered with the engine.
    pub registered: Vec<JobKey>,
    /// Keys that were already live and left alone.
    pub already_registered: Vec<JobKey>,
    /// Keys whose live trigger was replaced to match the catalog.
    pub rescheduled: Vec<JobKey>,
    /// Keys whose live payload was replaced to match the catalog.
    pub refreshed: Vec<JobKey>,
    /// Live keys with no active catalog row that were unregistered.
    pub removed: Vec<JobKey>,
    /// Rows that could not be brought in line, with the reason.
    pub failed: Vec<(JobKey, String)>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Build the engine registration for a catalog row.
pub(crate) fn job_detail(
    registry: &JobTypeRegistry,
    job: &JobConfiguration,
) -> Result<JobDetail, LifecycleError> {
    let handler = registry
        .resolve(&job.job_type)
        .map_err(|_| LifecycleError::UnresolvableType(job.job_type.clone()))?;

    Ok(JobDetail {
        key: job.key(),
        job_type: job.job_type.clone(),
        description: job.description.clone(),
        payload: job.job_data.clone(),
        handler,
    })
}

/// Brings the live engine in line with the catalog.
pub struct Reconciler {
    catalog: Arc<dyn JobCatalog>,
    engine: Arc<dyn SchedulerEngine>,
    registry: Arc<JobTypeRegistry>,
}

impl Reconciler {
    pub fn new(
        catalog: Arc<dyn JobCatalog>,
        engine: Arc<dyn SchedulerEngine>,
        registry: Arc<JobTypeRegistry>,
    ) -> Self {
        Self {
            catalog,
            engine,
            registry,
        }
    }

    /// Register every active row, then start the engine.
    ///
    /// Keys already live are skipped, so running this twice is harmless.
    /// Only a failure to read the catalog or start the engine is returned as
    /// an error.
    pub async fn load_catalog(&self) -> Result<ReconcileReport, LifecycleError> {
        let jobs = self.catalog.get_active().await?;
        info!("Loading {} active jobs into the scheduler", jobs.len());

        let mut report = ReconcileReport::default();
        for job in jobs {
            let key = job.key();
            match self.engine.exists(&key).await {
                Ok(true) => {
                    report.already_registered.push(key);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(job = %key, id = job.id, "Failed to query scheduler: {}", e);
                    report.failed.push((key, e.to_string()));
                    continue;
                }
            }

            match self.register(&job).await {
                Ok(()) => {
                    self.record_status(job.id, &key, SyncStatus::Registered).await;
                    report.registered.push(key);
                }
                Err(e) => {
                    error!(
                        job = %key,
                        id = job.id,
                        job_type = %job.job_type,
                        "Skipping job during startup: {}",
                        e
                    );
                    self.record_status(job.id, &key, SyncStatus::Unregistered).await;
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        self.engine.start().await?;
        info!(
            "Scheduler started: {} registered, {} already live, {} failed",
            report.registered.len(),
            report.already_registered.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Repair drift between the catalog and the engine.
    ///
    /// Registers missing rows and replaces any live schedule or payload that
    /// differs from the catalog. Live keys with no active row are unregistered
    /// and each row's sync status is rewritten.
    pub async fn sweep(&self) -> Result<ReconcileReport, LifecycleError> {
        let jobs = self.catalog.get_active().await?;
        let mut report = ReconcileReport::default();
        let mut active_keys = HashSet::new();

        for job in jobs {
            let key = job.key();
            active_keys.insert(key.clone());

            let status = match self.engine.trigger(&key).await {
                Ok(None) => match self.register(&job).await {
                    Ok(()) => {
                        info!(job = %key, "Registered missing job");
                        report.registered.push(key.clone());
                        SyncStatus::Registered
                    }
                    Err(e) => {
                        warn!(job = %key, id = job.id, "Could not register job: {}", e);
                        report.failed.push((key.clone(), e.to_string()));
                        SyncStatus::Unregistered
                    }
                },
                Ok(Some(trigger)) => self.align_live(&job, &trigger, &mut report).await,
                Err(e) => {
                    warn!(job = %key, id = job.id, "Failed to query scheduler: {}", e);
                    report.failed.push((key.clone(), e.to_string()));
                    continue;
                }
            };

            if job.sync_status != status {
                self.record_status(job.id, &key, status).await;
            }
        }

        for key in self.engine.list_registered_keys().await? {
            if active_keys.contains(&key) {
                continue;
            }
            match self.engine.unregister_job(&key).await {
                Ok(_) => {
                    info!(job = %key, "Unregistered job with no active catalog row");
                    report.removed.push(key);
                }
                Err(e) => {
                    warn!(job = %key, "Could not unregister orphaned job: {}", e);
                    report.failed.push((key, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Bring a live job's schedule and payload in line with its row.
    async fn align_live(
        &self,
        job: &JobConfiguration,
        trigger: &TriggerInfo,
        report: &mut ReconcileReport,
    ) -> SyncStatus {
        let key = job.key();
        let mut changed = false;

        if trigger.cron_expression != job.cron_expression {
            if let Err(e) = self.engine.replace_trigger(&key, &job.cron_expression).await {
                warn!(job = %key, id = job.id, "Could not reschedule job: {}", e);
                report.failed.push((key, e.to_string()));
                return SyncStatus::OutOfSync;
            }
            info!(
                job = %key,
                "Rescheduled '{}' -> '{}'",
                trigger.cron_expression,
                job.cron_expression
            );
            report.rescheduled.push(key.clone());
            changed = true;
        }

        let refresh = match self.engine.payload(&key).await {
            Ok(Some(live)) if live == job.job_data => Ok(false),
            Ok(_) => self
                .engine
                .update_payload(&key, &job.job_data)
                .await
                .map(|()| true),
            Err(e) => Err(e),
        };
        match refresh {
            Ok(true) => {
                info!(job = %key, "Refreshed stale job payload");
                report.refreshed.push(key.clone());
                changed = true;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(job = %key, id = job.id, "Could not refresh job payload: {}", e);
                report.failed.push((key, e.to_string()));
                return SyncStatus::OutOfSync;
            }
        }

        if !changed {
            report.already_registered.push(key);
        }
        SyncStatus::Registered
    }

    async fn register(&self, job: &JobConfiguration) -> Result<(), LifecycleError> {
        let detail = job_detail(&self.registry, job)?;
        self.engine
            .register_job(detail, &job.cron_expression)
            .await?;
        Ok(())
    }

    async fn record_status(&self, id: i64, key: &JobKey, status: SyncStatus) {
        if let Err(e) = self.catalog.set_sync_status(id, status).await {
            warn!(job = %key, id, "Failed to record sync status {}: {}", status, e);
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
