//! Persistent store of the group keys a node is a member of.

use std::sync::Arc;

use adtn_crypto::GroupKey;
use tracing::{info, warn};

use crate::{
    backend::{KeyStoreBackend, PersistedEntry, PersistedKeys},
    entry::{AddOutcome, KeyStoreEntry, RenameOutcome},
    error::KeyStoreError,
    store::{ChangeListener, KeyStore},
};

/// Longest accepted group alias, in characters
pub const MAX_GROUP_ALIAS_LEN: usize = 15;

// Writes every prospective state through to the backend.
struct BackendWriter<B> {
    backend: B,
}

impl<B: KeyStoreBackend> ChangeListener<GroupKey> for BackendWriter<B> {
    fn on_change(
        &self,
        next_id: u64,
        entries: &[KeyStoreEntry<GroupKey>],
    ) -> Result<(), KeyStoreError> {
        let keys = PersistedKeys {
            next_id,
            entries: entries
                .iter()
                .map(|entry| PersistedEntry {
                    id: entry.id(),
                    alias: entry.alias().to_owned(),
                    key: entry.key().encode().to_vec(),
                })
                .collect(),
        };
        self.backend
            .store(&keys)
            .inspect_err(|error| warn!(%error, "failed to save group keys"))
    }
}

/// Group keys with aliases, persisted on every change.
///
/// A mutation returns only after the backend has stored the new state. If
/// the backend fails, the mutation is not applied.
pub struct GroupKeyStore<B: KeyStoreBackend> {
    store: KeyStore<GroupKey, BackendWriter<B>>,
}

impl<B: KeyStoreBackend> GroupKeyStore<B> {
    /// Open the store kept in `backend`.
    ///
    /// With `create_empty`, any stored keys are discarded and an empty store
    /// is written. Otherwise the stored keys are loaded; a backend that holds
    /// nothing yet yields an empty store.
    ///
    /// # Errors
    ///
    /// - `WrongPassword`, `Corrupted`, `Io` from the backend
    /// - `Key` if a stored key does not decode
    pub fn open(backend: B, create_empty: bool) -> Result<Self, KeyStoreError> {
        let writer = BackendWriter { backend };

        if create_empty {
            writer.on_change(1, &[])?;
            info!("created empty group key store");
            return Ok(Self { store: KeyStore::with_listener(writer) });
        }

        let Some(persisted) = writer.backend.load()? else {
            info!("no stored group keys, starting empty");
            return Ok(Self { store: KeyStore::with_listener(writer) });
        };

        let entries = persisted
            .entries
            .iter()
            .map(|entry| Ok((entry.id, entry.alias.clone(), GroupKey::decode(&entry.key)?)))
            .collect::<Result<Vec<_>, KeyStoreError>>()?;

        let store = KeyStore::restore(persisted.next_id, entries, writer)?;
        info!(groups = store.len(), "opened group key store");
        Ok(Self { store })
    }

    /// Add a group key under `alias`.
    ///
    /// # Errors
    ///
    /// - `EmptyAlias` / `AliasTooLong` if the alias is invalid
    /// - Backend errors; the key is then not added
    pub fn add_entry(
        &self,
        alias: &str,
        key: GroupKey,
    ) -> Result<AddOutcome<GroupKey>, KeyStoreError> {
        validate_alias(alias)?;
        self.store.add_entry(alias, key)
    }

    /// Remove the groups with the given IDs.
    pub fn delete_entries(&self, ids: &[u64]) -> Result<usize, KeyStoreError> {
        self.store.delete_entries(ids)
    }

    /// Rename the group with ID `id`.
    ///
    /// # Errors
    ///
    /// - `EmptyAlias` / `AliasTooLong` if the alias is invalid
    /// - Backend errors; the rename is then not applied
    pub fn rename_entry(&self, id: u64, new_alias: &str) -> Result<RenameOutcome, KeyStoreError> {
        validate_alias(new_alias)?;
        self.store.rename_entry(id, new_alias)
    }

    /// Remove all groups.
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        self.store.clear()
    }

    /// Group with ID `id`.
    pub fn get_entry(&self, id: u64) -> Option<KeyStoreEntry<GroupKey>> {
        self.store.get_entry(id)
    }

    /// All groups in ID order.
    pub fn entries(&self) -> Arc<[KeyStoreEntry<GroupKey>]> {
        self.store.entries()
    }

    /// Keys of all groups in ID order, for trial decryption.
    pub fn keys(&self) -> Vec<GroupKey> {
        self.store.entries().iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True if the node is in no group.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Backend holding the persisted state.
    pub fn backend(&self) -> &B {
        &self.store.listener().backend
    }
}

impl<B: KeyStoreBackend> std::fmt::Debug for GroupKeyStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupKeyStore").field("groups", &self.store.len()).finish_non_exhaustive()
    }
}

fn validate_alias(alias: &str) -> Result<(), KeyStoreError> {
    if alias.trim().is_empty() {
        return Err(KeyStoreError::EmptyAlias);
    }
    let len = alias.chars().count();
    if len > MAX_GROUP_ALIAS_LEN {
        return Err(KeyStoreError::AliasTooLong { len, max: MAX_GROUP_ALIAS_LEN });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use adtn_crypto::SystemEnv;

    use super::*;
    use crate::backend::MemoryBackend;

    struct FailingBackend;

    impl KeyStoreBackend for FailingBackend {
        fn load(&self) -> Result<Option<PersistedKeys>, KeyStoreError> {
            Ok(None)
        }

        fn store(&self, _: &PersistedKeys) -> Result<(), KeyStoreError> {
            Err(KeyStoreError::Io("read-only file system".into()))
        }
    }

    fn key() -> GroupKey {
        GroupKey::generate(&SystemEnv::new())
    }

    #[test]
    fn every_mutation_is_persisted() {
        let backend = MemoryBackend::new();
        let store = GroupKeyStore::open(backend.clone(), false).unwrap();

        store.add_entry("family", key()).unwrap();
        assert_eq!(backend.stored().unwrap().entries.len(), 1);

        store.rename_entry(1, "relatives").unwrap();
        assert_eq!(backend.stored().unwrap().entries[0].alias, "relatives");

        store.delete_entries(&[1]).unwrap();
        let stored = backend.stored().unwrap();
        assert!(stored.entries.is_empty());
        assert_eq!(stored.next_id, 2);
    }

    #[test]
    fn reopen_restores_keys_and_ids() {
        let backend = MemoryBackend::new();
        let first = key();
        {
            let store = GroupKeyStore::open(backend.clone(), false).unwrap();
            store.add_entry("a", first.clone()).unwrap();
            store.add_entry("b", key()).unwrap();
            store.delete_entries(&[2]).unwrap();
        }

        let store = GroupKeyStore::open(backend, false).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get_entry(1).unwrap().key(), &first);
        assert_eq!(store.add_entry("c", key()).unwrap().id(), 3);
    }

    #[test]
    fn create_empty_discards_stored_keys() {
        let backend = MemoryBackend::new();
        GroupKeyStore::open(backend.clone(), false).unwrap().add_entry("a", key()).unwrap();

        let store = GroupKeyStore::open(backend.clone(), true).unwrap();

        assert!(store.is_empty());
        assert!(backend.stored().unwrap().entries.is_empty());
    }

    #[test]
    fn aliases_are_validated() {
        let store = GroupKeyStore::open(MemoryBackend::new(), false).unwrap();

        assert_eq!(store.add_entry("", key()).unwrap_err(), KeyStoreError::EmptyAlias);
        assert_eq!(store.add_entry("   ", key()).unwrap_err(), KeyStoreError::EmptyAlias);
        assert_eq!(
            store.add_entry("sixteen-chars-xx", key()).unwrap_err(),
            KeyStoreError::AliasTooLong { len: 16, max: 15 }
        );
        assert!(store.add_entry("fifteen-chars-x", key()).is_ok());
        assert!(store.rename_entry(1, "").is_err());
    }

    #[test]
    fn alias_length_counts_characters() {
        let store = GroupKeyStore::open(MemoryBackend::new(), false).unwrap();
        // 15 characters, 30 bytes
        assert!(store.add_entry(&"ä".repeat(15), key()).is_ok());
    }

    #[test]
    fn keys_follow_id_order() {
        let store = GroupKeyStore::open(MemoryBackend::new(), false).unwrap();
        let a = key();
        let b = key();
        store.add_entry("a", a.clone()).unwrap();
        store.add_entry("b", b.clone()).unwrap();

        assert_eq!(store.keys(), vec![a, b]);
    }

    #[test]
    fn backend_failure_rejects_mutation() {
        let store = GroupKeyStore {
            store: KeyStore::with_listener(BackendWriter { backend: FailingBackend }),
        };

        assert!(store.add_entry("a", key()).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn undecodable_stored_key_fails_open() {
        let backend = MemoryBackend::with_keys(PersistedKeys {
            next_id: 2,
            entries: vec![PersistedEntry { id: 1, alias: "a".into(), key: vec![0; 10] }],
        });

        assert!(matches!(GroupKeyStore::open(backend, false), Err(KeyStoreError::Key(_))));
    }

    #[test]
    fn failing_backend_fails_create() {
        assert!(GroupKeyStore::open(FailingBackend, true).is_err());
    }
}
