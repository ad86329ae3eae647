//! Error types for the jobplane protocol layer.

mod catalog;
mod engine;
mod job;
mod registry;

pub use catalog::*;
pub use engine::*;
pub use job::*;
pub use registry::*;
