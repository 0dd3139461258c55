//! Key store entries and mutation outcomes.

use adtn_crypto::GroupKey;

/// Key that can be held by a [`crate::KeyStore`].
///
/// Two keys are the same key iff their `key_bytes` are equal; the store uses
/// this to reject duplicate keys under different aliases.
pub trait StoreKey: Clone + Send + Sync + 'static {
    /// Canonical byte encoding of the key.
    fn key_bytes(&self) -> Vec<u8>;
}

impl StoreKey for GroupKey {
    fn key_bytes(&self) -> Vec<u8> {
        self.encode().to_vec()
    }
}

/// One stored key with its identifier and alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStoreEntry<K> {
    id: u64,
    alias: String,
    key: K,
}

impl<K> KeyStoreEntry<K> {
    pub(crate) fn new(id: u64, alias: String, key: K) -> Self {
        debug_assert_ne!(id, 0, "entry IDs are non-zero");
        Self { id, alias, key }
    }

    /// Store-unique, non-zero identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Store-unique alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Key material.
    pub fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn set_alias(&mut self, alias: String) {
        self.alias = alias;
    }
}

/// Result of [`crate::KeyStore::add_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome<K> {
    /// Entry was inserted
    Added(KeyStoreEntry<K>),
    /// Another entry already uses the alias; nothing was inserted
    AliasInUse {
        /// ID of the entry holding the alias
        existing_id: u64,
    },
    /// Another entry already holds the key; nothing was inserted
    KeyInUse {
        /// ID of the entry holding the key
        existing_id: u64,
    },
}

impl<K> AddOutcome<K> {
    /// ID of the new entry, or of the conflicting one.
    pub fn id(&self) -> u64 {
        match self {
            Self::Added(entry) => entry.id(),
            Self::AliasInUse { existing_id } | Self::KeyInUse { existing_id } => *existing_id,
        }
    }

    /// The inserted entry, if the add succeeded.
    pub fn entry(&self) -> Option<&KeyStoreEntry<K>> {
        match self {
            Self::Added(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Result of [`crate::KeyStore::rename_entry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Entry was renamed
    Renamed(u64),
    /// Another entry already uses the alias; nothing changed
    AliasInUse {
        /// ID of the entry holding the alias
        existing_id: u64,
    },
    /// No entry has the given ID
    UnknownId,
}

impl RenameOutcome {
    /// Renamed ID, conflicting ID, or `0` for an unknown ID.
    pub fn id(&self) -> u64 {
        match self {
            Self::Renamed(id) => *id,
            Self::AliasInUse { existing_id } => *existing_id,
            Self::UnknownId => 0,
        }
    }
}
