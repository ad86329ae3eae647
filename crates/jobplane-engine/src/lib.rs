//! # jobplane Engine
//!
//! In-process cron scheduling engine.
//!
//! [`CronEngine`] keeps one trigger per [`JobKey`](jobplane_protocols::JobKey),
//! evaluates cron schedules on a fixed tick, and runs due jobs through
//! [`jobplane_core::execute_job`] on the tokio runtime.

pub mod config;
pub mod engine;
pub mod trigger;

pub use config::EngineConfig;
pub use engine::CronEngine;
pub use trigger::validate_cron_expression;
