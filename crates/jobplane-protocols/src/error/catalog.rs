//! Job catalog errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Job configuration not found: {0}")]
    NotFound(String),

    /// An active row already exists for the same job key.
    #[error("Job configuration conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}
