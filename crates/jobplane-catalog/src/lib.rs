//! # jobplane Catalog
//!
//! Durable storage for job configurations.
//!
//! - [`SqliteJobCatalog`] - SQLite file backend used in production
//! - [`MemoryJobCatalog`] - In-process backend for tests and throwaway setups

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryJobCatalog;
pub use sqlite::SqliteJobCatalog;
