//! # jobplane Core
//!
//! Building blocks shared by the engine and the control plane.
//!
//! ## Components
//!
//! - [`JobTypeRegistry`] - Maps job type identifiers to executable handlers
//! - [`execute_job`] - Uniform envelope every job execution runs inside
//! - [`builtin`] - Job types that ship with jobplane

pub mod builtin;
pub mod execution;
pub mod registry;

pub use execution::execute_job;
pub use registry::{JobTypeEntry, JobTypeRegistry};

#[doc(hidden)]
pub use inventory;
