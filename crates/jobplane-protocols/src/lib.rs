//! # jobplane Protocols
//!
//! Core protocol definitions (traits) for the jobplane control plane.
//! Contains only interface definitions and shared value types - no implementations.
//!
//! ## Core Traits
//!
//! - [`JobHandler`] - Executable job implementation resolved by type identifier
//! - [`SchedulerEngine`] - Live, in-process scheduling engine
//! - [`JobCatalog`] - Durable catalog of job configurations

pub mod catalog;
pub mod engine;
pub mod error;
pub mod job;

pub use catalog::{JobCatalog, JobConfiguration, JobUpdate, NewJob, SyncStatus};
pub use engine::{JobDetail, SchedulerEngine, TriggerInfo, TriggerState};
pub use error::{CatalogError, EngineError, JobError, RegistryError};
pub use job::{JobContext, JobHandler, JobKey, DEFAULT_GROUP};
