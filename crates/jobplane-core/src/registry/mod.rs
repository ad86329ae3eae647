//! Registries for job implementations.

mod base;
mod job_type;

pub use base::{BaseRegistry, Registerable};
pub use job_type::{JobTypeEntry, JobTypeRegistry, default_factory};
