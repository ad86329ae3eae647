//! Job scheduling control plane.
//!
//! - [`JobLifecycleService`] - create, update, trigger, pause, resume, delete, list
//! - [`Reconciler`] - startup load and drift-repair sweep
//! - [`spawn_sweep`] - periodic sweep task

mod error;
mod reconciler;
pub mod routes;
mod service;
mod sweep;
mod view;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ErrorKind, LifecycleError};
pub use reconciler::{ReconcileReport, Reconciler};
pub use service::{ControlOutcome, JobLifecycleService, JobTypeInfo};
pub use sweep::spawn_sweep;
pub use view::JobScheduleView;
