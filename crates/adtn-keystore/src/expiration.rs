//! Sharing window for freshly created group keys.
//!
//! A group key may be handed to new members only for a fixed interval after
//! its creation. [`ShareExpiration`] remembers when each key was created and
//! forgets stamps once they fall outside the interval.

use std::collections::{BTreeMap, HashMap};

use adtn_crypto::{Environment, SystemEnv};

/// Creation timestamps of group keys, keyed by key store ID.
///
/// Timestamps are wall-clock seconds from the injected [`Environment`].
#[derive(Debug, Clone)]
pub struct ShareExpiration<E: Environment = SystemEnv> {
    env: E,
    interval_secs: u64,
    entries: HashMap<u64, u64>,
}

impl ShareExpiration<SystemEnv> {
    /// Empty bookkeeping with the system clock.
    pub fn new(interval_secs: u64) -> Self {
        Self::with_env(interval_secs, SystemEnv::new())
    }
}

impl<E: Environment> ShareExpiration<E> {
    /// Empty bookkeeping with a custom clock.
    pub fn with_env(interval_secs: u64, env: E) -> Self {
        Self { env, interval_secs, entries: HashMap::new() }
    }

    /// Restore from a persisted snapshot, dropping stamps that expired since.
    pub fn from_snapshot(
        interval_secs: u64,
        env: E,
        snapshot: impl IntoIterator<Item = (u64, u64)>,
    ) -> Self {
        let mut expiration = Self::with_env(interval_secs, env);
        for (id, created) in snapshot {
            expiration.insert(id, created);
        }
        expiration
    }

    /// Sharing interval in seconds.
    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// Stamp key `id` as created now and return the stamp.
    pub fn record(&mut self, id: u64) -> u64 {
        let now = self.env.wall_clock_secs();
        self.insert(id, now);
        now
    }

    /// Stamp key `id` with `created`, unless that stamp already expired.
    pub fn insert(&mut self, id: u64, created: u64) {
        if !self.is_expired(created) {
            self.entries.insert(id, created);
        }
    }

    /// Creation stamp of key `id`, or `None` if unknown or expired.
    pub fn created_at(&self, id: u64) -> Option<u64> {
        self.entries.get(&id).copied().filter(|created| !self.is_expired(*created))
    }

    /// True if a key created at `created` may no longer be shared.
    pub fn is_expired(&self, created: u64) -> bool {
        created.saturating_add(self.interval_secs) < self.env.wall_clock_secs()
    }

    /// Forget all stamps.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Unexpired stamps, ordered by key ID, for persistence.
    pub fn snapshot(&self) -> BTreeMap<u64, u64> {
        self.entries
            .iter()
            .filter(|(_, created)| !self.is_expired(**created))
            .map(|(id, created)| (*id, *created))
            .collect()
    }
}
