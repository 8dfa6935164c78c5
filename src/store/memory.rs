//! Reference, in-process [`StateStore`] implementation.
//!
//! Guards a `HashMap<String, Versioned<T>>` behind a single `RwLock`, the
//! same "one lock around one inner struct" shape this codebase already uses
//! for its in-process resource registries. This is explicitly a stand-in for
//! a real compare-and-swap-capable backend: it gives the
//! broker and the test suite something concrete to run against without
//! coordinating across processes. Running two broker processes against two
//! independent `MemoryStore`s would not be safe; a real deployment replaces
//! this module, not the trait.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::store::{Labeled, StateStore, StoreError, Version, Versioned};

#[derive(Debug)]
pub struct MemoryStore<T> {
    inner: RwLock<HashMap<String, Versioned<T>>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self { inner: RwLock::new(HashMap::new()) }
    }
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T> StateStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + Labeled + 'static,
{
    async fn fetch_by_name(&self, name: &str) -> Result<Option<Versioned<T>>, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        Ok(guard.get(name).cloned())
    }

    async fn create_if_absent(&self, name: &str, value: T) -> Result<Versioned<T>, StoreError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        if guard.contains_key(name) {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }
        let versioned = Versioned::new(value, Version(1));
        guard.insert(name.to_string(), versioned.clone());
        Ok(versioned)
    }

    async fn update_with_version(&self, name: &str, expected_version: &Version, value: T) -> Result<Versioned<T>, StoreError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        match guard.get(name) {
            None => Err(StoreError::NotFound(name.to_string())),
            Some(current) if current.version != *expected_version => Err(StoreError::VersionConflict { name: name.to_string() }),
            Some(current) => {
                let next_version = Version(current.version.0 + 1);
                let versioned = Versioned::new(value, next_version);
                guard.insert(name.to_string(), versioned.clone());
                Ok(versioned)
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<Versioned<T>>, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        Ok(guard.values().cloned().collect())
    }

    async fn list_by_label(&self, key: &str, value: &str) -> Result<Vec<Versioned<T>>, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::Backend("lock poisoned".into()))?;
        Ok(guard
            .values()
            .filter(|versioned| versioned.value.labels().get(key).map(|v| v == value).unwrap_or(false))
            .cloned()
            .collect())
    }
}
