//! Job execution wrapper.
//!
//! Every execution, scheduled or manual, runs through [`execute_job`]. It logs
//! start, completion, and failure with the job key and fire instance, and turns
//! a panicking handler into [`JobError::Panicked`]. Failures are returned to the
//! caller unchanged; retry and misfire policy belong to the engine.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{error, info};

use jobplane_protocols::error::JobError;
use jobplane_protocols::job::{JobContext, JobHandler};

/// Run one execution of `handler` inside the standard envelope.
pub async fn execute_job(handler: Arc<dyn JobHandler>, ctx: JobContext) -> Result<(), JobError> {
    let key = ctx.key.clone();
    let fire_instance_id = ctx.fire_instance_id;
    let started = Instant::now();

    info!(
        job = %key,
        fire_instance = %fire_instance_id,
        job_type = handler.job_type(),
        manual = ctx.manual,
        "Job '{}' started at {}",
        key,
        ctx.fired_at.to_rfc3339()
    );

    let outcome = AssertUnwindSafe(handler.execute(ctx)).catch_unwind().await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(())) => {
            info!(
                job = %key,
                fire_instance = %fire_instance_id,
                elapsed_ms,
                "Job '{}' completed",
                key
            );
            Ok(())
        }
        Ok(Err(e)) => {
            error!(
                job = %key,
                fire_instance = %fire_instance_id,
                elapsed_ms,
                error = ?e,
                "Job '{}' failed: {}",
                key,
                e
            );
            Err(e)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(
                job = %key,
                fire_instance = %fire_instance_id,
                elapsed_ms,
                "Job '{}' panicked: {}",
                key,
                message
            );
            Err(JobError::Panicked(message))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
