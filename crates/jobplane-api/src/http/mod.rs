//! HTTP interface module.
//!
//! Provides REST API endpoints for:
//! - Job management and control
//! - Health checks and monitoring

pub mod routes;

pub(crate) mod monitoring;
