//! Generic in-memory key store.
//!
//! Entries are indexed by ID, alias and key bytes. Aliases and keys are unique
//! within a store. Every mutation builds the next state, hands its snapshot to
//! the [`ChangeListener`], and only installs it if the listener succeeds, so a
//! failed save leaves the store exactly as it was.
//!
//! # Invariants
//!
//! - IDs are non-zero, allocated in increasing order, and never reused
//! - `ids_by_alias` and `ids_by_key` index exactly the entries in `entries`
//! - `snapshot` holds the entries in ID order
//! - All state lives behind one mutex; readers never see a partial update

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;
use zeroize::Zeroize;

use crate::{
    entry::{AddOutcome, KeyStoreEntry, RenameOutcome, StoreKey},
    error::KeyStoreError,
};

/// Observer of committed store contents.
///
/// Called under the store lock with the state a mutation is about to install.
/// Returning an error aborts the mutation.
pub trait ChangeListener<K>: Send + Sync {
    /// Persist or otherwise react to the prospective contents.
    fn on_change(&self, next_id: u64, entries: &[KeyStoreEntry<K>]) -> Result<(), KeyStoreError>;
}

impl<K> ChangeListener<K> for () {
    fn on_change(&self, _next_id: u64, _entries: &[KeyStoreEntry<K>]) -> Result<(), KeyStoreError> {
        Ok(())
    }
}

/// Key material used as an index key, wiped when the index drops it.
#[derive(Clone, PartialEq, Eq, Hash)]
struct KeyBytes(Vec<u8>);

impl KeyBytes {
    fn of<K: StoreKey>(key: &K) -> Self {
        Self(key.key_bytes())
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Clone)]
struct State<K> {
    entries: BTreeMap<u64, KeyStoreEntry<K>>,
    ids_by_alias: HashMap<String, u64>,
    ids_by_key: HashMap<KeyBytes, u64>,
    next_id: u64,
    snapshot: Arc<[KeyStoreEntry<K>]>,
}

impl<K: StoreKey> State<K> {
    fn empty(next_id: u64) -> Self {
        Self {
            entries: BTreeMap::new(),
            ids_by_alias: HashMap::new(),
            ids_by_key: HashMap::new(),
            next_id,
            snapshot: Arc::from(Vec::new()),
        }
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot = self.entries.values().cloned().collect();
    }

    fn remove(&mut self, id: u64) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        self.ids_by_alias.remove(entry.alias());
        self.ids_by_key.remove(&KeyBytes::of(entry.key()));
        true
    }
}

/// Thread-safe store of keys with unique aliases.
pub struct KeyStore<K: StoreKey, L: ChangeListener<K> = ()> {
    state: Mutex<State<K>>,
    listener: L,
}

impl<K: StoreKey> KeyStore<K, ()> {
    /// Empty store without a listener.
    pub fn new() -> Self {
        Self::with_listener(())
    }
}

impl<K: StoreKey> Default for KeyStore<K, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StoreKey, L: ChangeListener<K>> KeyStore<K, L> {
    /// Empty store reporting changes to `listener`. IDs start at 1.
    pub fn with_listener(listener: L) -> Self {
        Self { state: Mutex::new(State::empty(1)), listener }
    }

    /// Rebuild a store from persisted `(id, alias, key)` triples.
    ///
    /// `next_id` is raised above the largest restored ID if needed. The
    /// listener is not called.
    ///
    /// # Errors
    ///
    /// - `Corrupted` if an ID is zero or any ID, alias or key repeats
    pub fn restore(
        next_id: u64,
        entries: impl IntoIterator<Item = (u64, String, K)>,
        listener: L,
    ) -> Result<Self, KeyStoreError> {
        let mut state = State::empty(next_id.max(1));

        for (id, alias, key) in entries {
            if id == 0 {
                return Err(KeyStoreError::Corrupted("entry with ID 0".to_string()));
            }
            if state.entries.contains_key(&id) {
                return Err(KeyStoreError::Corrupted(format!("duplicate entry ID {id}")));
            }
            if state.ids_by_alias.contains_key(&alias) {
                return Err(KeyStoreError::Corrupted(format!("duplicate alias for entry {id}")));
            }
            let bytes = KeyBytes::of(&key);
            if state.ids_by_key.contains_key(&bytes) {
                return Err(KeyStoreError::Corrupted(format!("duplicate key for entry {id}")));
            }

            if id >= state.next_id {
                state.next_id = id.checked_add(1).ok_or(KeyStoreError::IdSpaceExhausted)?;
            }
            state.ids_by_alias.insert(alias.clone(), id);
            state.ids_by_key.insert(bytes, id);
            state.entries.insert(id, KeyStoreEntry::new(id, alias, key));
        }

        state.refresh_snapshot();
        debug!(entries = state.entries.len(), next_id = state.next_id, "key store restored");
        Ok(Self { state: Mutex::new(state), listener })
    }

    /// Add `key` under `alias`.
    ///
    /// An alias conflict is reported before a key conflict. Conflicts change
    /// nothing and do not notify the listener.
    ///
    /// # Errors
    ///
    /// - `IdSpaceExhausted` if no ID is left
    /// - Any error of the listener; the entry is then not added
    pub fn add_entry(&self, alias: &str, key: K) -> Result<AddOutcome<K>, KeyStoreError> {
        let mut state = self.lock();

        if let Some(&existing_id) = state.ids_by_alias.get(alias) {
            return Ok(AddOutcome::AliasInUse { existing_id });
        }
        let bytes = KeyBytes::of(&key);
        if let Some(&existing_id) = state.ids_by_key.get(&bytes) {
            return Ok(AddOutcome::KeyInUse { existing_id });
        }

        let id = state.next_id;
        let entry = KeyStoreEntry::new(id, alias.to_owned(), key);

        let mut next = state.clone();
        next.next_id = id.checked_add(1).ok_or(KeyStoreError::IdSpaceExhausted)?;
        next.ids_by_alias.insert(alias.to_owned(), id);
        next.ids_by_key.insert(bytes, id);
        next.entries.insert(id, entry.clone());
        next.refresh_snapshot();

        self.commit(&mut state, next)?;
        debug!(id, "key store entry added");
        Ok(AddOutcome::Added(entry))
    }

    /// Remove every entry whose ID is in `ids`. Unknown IDs are ignored.
    ///
    /// The listener is notified once if anything was removed. Returns the
    /// number of removed entries.
    pub fn delete_entries(&self, ids: &[u64]) -> Result<usize, KeyStoreError> {
        let mut state = self.lock();

        let targets: HashSet<u64> =
            ids.iter().copied().filter(|id| state.entries.contains_key(id)).collect();
        if targets.is_empty() {
            return Ok(0);
        }

        let mut next = state.clone();
        for &id in &targets {
            next.remove(id);
        }
        next.refresh_snapshot();

        self.commit(&mut state, next)?;
        debug!(count = targets.len(), "key store entries deleted");
        Ok(targets.len())
    }

    /// Give entry `id` a new alias.
    ///
    /// Renaming an entry to the alias it already has succeeds without
    /// notifying the listener.
    pub fn rename_entry(&self, id: u64, new_alias: &str) -> Result<RenameOutcome, KeyStoreError> {
        let mut state = self.lock();

        let Some(entry) = state.entries.get(&id) else {
            return Ok(RenameOutcome::UnknownId);
        };
        match state.ids_by_alias.get(new_alias) {
            Some(&existing_id) if existing_id == id => return Ok(RenameOutcome::Renamed(id)),
            Some(&existing_id) => return Ok(RenameOutcome::AliasInUse { existing_id }),
            None => {},
        }
        let old_alias = entry.alias().to_owned();

        let mut next = state.clone();
        next.ids_by_alias.remove(&old_alias);
        next.ids_by_alias.insert(new_alias.to_owned(), id);
        if let Some(entry) = next.entries.get_mut(&id) {
            entry.set_alias(new_alias.to_owned());
        }
        next.refresh_snapshot();

        self.commit(&mut state, next)?;
        debug!(id, "key store entry renamed");
        Ok(RenameOutcome::Renamed(id))
    }

    /// Remove every entry. IDs keep counting from where they were.
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        let mut state = self.lock();
        if state.entries.is_empty() {
            return Ok(());
        }

        let next = State::empty(state.next_id);
        self.commit(&mut state, next)?;
        debug!("key store cleared");
        Ok(())
    }

    /// Entry with the given ID.
    pub fn get_entry(&self, id: u64) -> Option<KeyStoreEntry<K>> {
        self.lock().entries.get(&id).cloned()
    }

    /// All entries in ID order.
    ///
    /// The returned snapshot is unaffected by later mutations.
    pub fn entries(&self) -> Arc<[KeyStoreEntry<K>]> {
        Arc::clone(&self.lock().snapshot)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// ID the next added entry will receive.
    pub fn next_id(&self) -> u64 {
        self.lock().next_id
    }

    /// Listener receiving changes.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    // Poisoning is recovered: state is only ever replaced whole.
    fn lock(&self) -> MutexGuard<'_, State<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(
        &self,
        state: &mut MutexGuard<'_, State<K>>,
        next: State<K>,
    ) -> Result<(), KeyStoreError> {
        self.listener.on_change(next.next_id, &next.snapshot)?;
        **state = next;
        Ok(())
    }
}

impl<K: StoreKey, L: ChangeListener<K>> std::fmt::Debug for KeyStore<K, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("KeyStore")
            .field("entries", &state.entries.len())
            .field("next_id", &state.next_id)
            .finish_non_exhaustive()
    }
}
