//! Periodic reconciliation sweep.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::service::JobLifecycleService;

/// Run [`JobLifecycleService::reconcile`] every `interval` until `shutdown` changes.
///
/// The first sweep happens one full interval after spawning.
pub fn spawn_sweep(
    service: Arc<JobLifecycleService>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Reconciliation sweep started (interval: {:?})", interval);

        let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match service.reconcile().await {
                        Ok(report) if report.is_clean() => {
                            debug!(
                                "Sweep complete: {} registered, {} rescheduled, {} removed",
                                report.registered.len(),
                                report.rescheduled.len(),
                                report.removed.len()
                            );
                        }
                        Ok(report) => {
                            warn!("Sweep left {} jobs out of sync", report.failed.len());
                        }
                        Err(e) => error!("Reconciliation sweep failed: {}", e),
                    }
                }
                _ = shutdown.changed() => {
                    info!("Reconciliation sweep shutting down");
                    break;
                }
            }
        }
    })
}
