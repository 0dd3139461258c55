use std::sync::{Arc, Mutex, PoisonError};

use super::{KeyStoreBackend, PersistedKeys};
use crate::error::KeyStoreError;

/// In-memory backend for testing and simulation
///
/// Clones share the same stored value, so a test can keep one clone and
/// inspect what a store persisted through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<Option<PersistedKeys>>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-loaded with `keys`
    pub fn with_keys(keys: PersistedKeys) -> Self {
        Self { inner: Arc::new(Mutex::new(Some(keys))) }
    }

    /// Currently stored value
    pub fn stored(&self) -> Option<PersistedKeys> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl KeyStoreBackend for MemoryBackend {
    fn load(&self) -> Result<Option<PersistedKeys>, KeyStoreError> {
        Ok(self.stored())
    }

    fn store(&self, keys: &PersistedKeys) -> Result<(), KeyStoreError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(keys.clone());
        Ok(())
    }
}
