//! Node preferences consumed by the sending pool.
//!
//! [`Preferences`] is an immutable snapshot. Changes go through a
//! [`PreferencesEditor`] value that is validated and applied as a whole, so a
//! reader never sees a half-edited set of values.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PacketError;

/// Tunable parameters of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Seconds between two send rounds
    pub send_interval_secs: u64,
    /// Pool size below which the pool is refilled with cover packets
    pub refill_threshold: u64,
    /// Packets sent per round
    pub batch_size: u64,
    /// Join ad-hoc networks without asking
    pub auto_join_ad_hoc_network: bool,
    /// Show help buttons in the user interface
    pub show_help_buttons: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            send_interval_secs: 10,
            refill_threshold: 10,
            batch_size: 10,
            auto_join_ad_hoc_network: true,
            show_help_buttons: true,
        }
    }
}

impl Preferences {
    /// Start an edit based on this snapshot.
    pub fn edit(&self) -> PreferencesEditor {
        PreferencesEditor { draft: *self }
    }
}

/// Pending change to a [`Preferences`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "an editor does nothing until applied"]
pub struct PreferencesEditor {
    draft: Preferences,
}

impl PreferencesEditor {
    /// Set the send interval.
    pub fn send_interval_secs(mut self, secs: u64) -> Self {
        self.draft.send_interval_secs = secs;
        self
    }

    /// Set the refill threshold.
    pub fn refill_threshold(mut self, threshold: u64) -> Self {
        self.draft.refill_threshold = threshold;
        self
    }

    /// Set the batch size.
    pub fn batch_size(mut self, size: u64) -> Self {
        self.draft.batch_size = size;
        self
    }

    /// Set whether ad-hoc networks are joined automatically.
    pub fn auto_join_ad_hoc_network(mut self, enabled: bool) -> Self {
        self.draft.auto_join_ad_hoc_network = enabled;
        self
    }

    /// Set whether help buttons are shown.
    pub fn show_help_buttons(mut self, enabled: bool) -> Self {
        self.draft.show_help_buttons = enabled;
        self
    }

    /// Validate the edit and produce the new snapshot.
    ///
    /// # Errors
    ///
    /// - `InvalidPreference` if a count or interval is zero
    pub fn apply(self) -> Result<Preferences, PacketError> {
        let draft = self.draft;
        for (name, value) in [
            ("send_interval_secs", draft.send_interval_secs),
            ("refill_threshold", draft.refill_threshold),
            ("batch_size", draft.batch_size),
        ] {
            if value == 0 {
                return Err(PacketError::InvalidPreference { name, value });
            }
        }
        Ok(draft)
    }
}

/// Current preferences shared between threads.
///
/// Readers get an `Arc` to a whole snapshot; [`commit`](Self::commit)
/// replaces it in one step.
#[derive(Debug, Default)]
pub struct SharedPreferences {
    current: RwLock<Arc<Preferences>>,
}

impl SharedPreferences {
    /// Share `initial`.
    pub fn new(initial: Preferences) -> Self {
        Self { current: RwLock::new(Arc::new(initial)) }
    }

    /// Current snapshot.
    pub fn current(&self) -> Arc<Preferences> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Start an edit based on the current snapshot.
    pub fn edit(&self) -> PreferencesEditor {
        self.current().edit()
    }

    /// Apply `editor` and publish the result.
    ///
    /// On error the current snapshot is left unchanged.
    pub fn commit(&self, editor: PreferencesEditor) -> Result<Arc<Preferences>, PacketError> {
        let next = Arc::new(editor.apply()?);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
        info!(
            send_interval_secs = next.send_interval_secs,
            batch_size = next.batch_size,
            refill_threshold = next.refill_threshold,
            "preferences updated"
        );
        Ok(next)
    }
}
