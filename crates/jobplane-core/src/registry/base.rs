//! Base registry trait and implementation.

use dashmap::DashMap;
use std::sync::Arc;

use jobplane_protocols::error::RegistryError;

/// Trait for items that can be stored in a registry.
///
/// Each registerable item must provide a unique ID.
pub trait Registerable: Send + Sync {
    /// Returns the unique identifier for this item.
    fn registry_id(&self) -> &str;
}

/// Generic registry for managing items by ID.
///
/// Thread-safe storage using DashMap, with duplicate checking on register.
///
/// # Type Parameters
///
/// * `T` - The trait object type to store (e.g., `dyn JobHandler`)
pub struct BaseRegistry<T: ?Sized + Registerable> {
    items: DashMap<String, Arc<T>>,
}

impl<T: ?Sized + Registerable> BaseRegistry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Register an item.
    ///
    /// Returns an error if an item with the same ID is already registered.
    pub fn register(&self, item: Arc<T>) -> Result<(), RegistryError> {
        let id = item.registry_id().to_string();

        match self.items.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                Err(RegistryError::AlreadyRegistered(entry.key().clone()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(item);
                Ok(())
            }
        }
    }

    /// Unregister an item by ID.
    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        self.items
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        Ok(())
    }

    /// Get an item by ID.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.get(id).map(|item| item.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// List all registered item IDs.
    pub fn list_ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over all items.
    pub fn iter(&self) -> impl Iterator<Item = Arc<T>> + '_ {
        self.items.iter().map(|entry| entry.value().clone())
    }
}

impl<T: ?Sized + Registerable> Default for BaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
