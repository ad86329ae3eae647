//! Job type registry.
//!
//! Job implementations self-register with [`register_job_type!`], which submits
//! a [`JobTypeEntry`] through `inventory`. [`JobTypeRegistry::discover`] builds
//! a registry from every entry linked into the process, so resolving a type
//! is a map lookup rather than a runtime scan.
//!
//! ```ignore
//! #[derive(Default)]
//! struct NightlyReport;
//!
//! #[async_trait]
//! impl JobHandler for NightlyReport { /* ... */ }
//!
//! jobplane_core::register_job_type!(NightlyReport);
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use jobplane_protocols::error::RegistryError;
use jobplane_protocols::job::JobHandler;

use super::base::{BaseRegistry, Registerable};

impl Registerable for dyn JobHandler {
    fn registry_id(&self) -> &str {
        self.job_type()
    }
}

/// A job implementation submitted for discovery.
pub struct JobTypeEntry {
    pub factory: fn() -> Arc<dyn JobHandler>,
}

impl JobTypeEntry {
    pub const fn new(factory: fn() -> Arc<dyn JobHandler>) -> Self {
        Self { factory }
    }
}

inventory::collect!(JobTypeEntry);

#[doc(hidden)]
pub fn default_factory<T: JobHandler + Default + 'static>() -> Arc<dyn JobHandler> {
    Arc::new(T::default())
}

/// Register a `Default`-constructible job type for discovery.
#[macro_export]
macro_rules! register_job_type {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::registry::JobTypeEntry::new($crate::registry::default_factory::<$ty>)
        }
    };
}

/// Handlers from every linked entry, instantiated once per process.
static DISCOVERED: Lazy<Vec<Arc<dyn JobHandler>>> = Lazy::new(|| {
    inventory::iter::<JobTypeEntry>()
        .map(|entry| (entry.factory)())
        .collect()
});

/// Registry mapping job type identifiers to handlers.
pub struct JobTypeRegistry {
    inner: BaseRegistry<dyn JobHandler>,
}

impl JobTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: BaseRegistry::new(),
        }
    }

    /// Create a registry holding every self-registered job type.
    ///
    /// Duplicate identifiers keep the first entry and log a warning.
    pub fn discover() -> Self {
        let registry = Self::new();
        for handler in DISCOVERED.iter() {
            if let Err(e) = registry.register(handler.clone()) {
                warn!("Skipping job type during discovery: {}", e);
            }
        }
        debug!("Discovered {} job types", registry.len());
        registry
    }

    /// Register a handler under its job type.
    pub fn register(&self, handler: Arc<dyn JobHandler>) -> Result<(), RegistryError> {
        self.inner.register(handler)
    }

    pub fn unregister(&self, job_type: &str) -> Result<(), RegistryError> {
        self.inner.unregister(job_type)
    }

    /// Look up a handler by job type.
    pub fn resolve(&self, job_type: &str) -> Result<Arc<dyn JobHandler>, RegistryError> {
        self.inner
            .get(job_type)
            .ok_or_else(|| RegistryError::NotFound(job_type.to_string()))
    }

    pub fn contains(&self, job_type: &str) -> bool {
        self.inner.contains(job_type)
    }

    /// All registered job type identifiers, sorted.
    pub fn list_types(&self) -> Vec<String> {
        let mut types = self.inner.list_ids();
        types.sort();
        types
    }

    /// `(job_type, description)` pairs, sorted by type.
    pub fn describe_types(&self) -> Vec<(String, String)> {
        let mut described: Vec<(String, String)> = self
            .inner
            .iter()
            .map(|h| (h.job_type().to_string(), h.description().to_string()))
            .collect();
        described.sort();
        described
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for JobTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
