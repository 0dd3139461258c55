//! Persistence backends for key stores.
//!
//! A backend stores the complete key list on every change. The store never
//! sends deltas, so a backend only needs whole-value `load` and `store`.
//!
//! Two implementations:
//!
//! - [`MemoryBackend`]: shared in-process value, for tests and simulation
//! - [`EncryptedFileBackend`]: password-protected file on disk

mod file;
mod memory;

pub use file::{
    EncryptedFileBackend, FILE_MAGIC, FILE_VERSION, Password, PasswordKdfParams, open_keys,
    seal_keys,
};
pub use memory::MemoryBackend;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::KeyStoreError;

/// One persisted key store entry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// Entry ID
    pub id: u64,
    /// Entry alias
    pub alias: String,
    /// Encoded key
    pub key: Vec<u8>,
}

impl std::fmt::Debug for PersistedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedEntry")
            .field("id", &self.id)
            .field("alias", &self.alias)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl Drop for PersistedEntry {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Complete persisted state of a key store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedKeys {
    /// ID the next added entry will receive
    pub next_id: u64,
    /// Entries in ID order
    pub entries: Vec<PersistedEntry>,
}

/// Whole-value storage for a key list.
pub trait KeyStoreBackend: Send + Sync {
    /// Load the stored key list, or `None` if nothing was stored yet.
    fn load(&self) -> Result<Option<PersistedKeys>, KeyStoreError>;

    /// Replace the stored key list.
    fn store(&self, keys: &PersistedKeys) -> Result<(), KeyStoreError>;
}
