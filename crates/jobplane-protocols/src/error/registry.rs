//! Job type registry errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Job type not found: {0}")]
    NotFound(String),

    #[error("Job type already registered: {0}")]
    AlreadyRegistered(String),
}
