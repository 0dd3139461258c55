//! aDTN Key Store
//!
//! Keeps the group keys a node holds, each under a unique ID and a unique
//! alias, and persists them encrypted with a user password.
//!
//! # Layers
//!
//! - [`KeyStore`]: generic, thread-safe store of aliased keys with a
//!   write-through [`ChangeListener`]
//! - [`KeyStoreBackend`]: whole-value persistence ([`MemoryBackend`],
//!   [`EncryptedFileBackend`])
//! - [`GroupKeyStore`]: group keys, alias rules and backend wiring
//! - [`ShareExpiration`]: how long a new group key may still be shared
//!
//! # File Format
//!
//! ```text
//! "ADTNKS" | version (1) | salt (16) | nonce (24) | XChaCha20-Poly1305(CBOR)
//! ```
//!
//! The file key is derived from the password with Argon2id. The header is
//! authenticated as associated data.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod backend;
pub mod entry;
pub mod error;
pub mod expiration;
pub mod group;
pub mod store;

pub use backend::{
    EncryptedFileBackend, KeyStoreBackend, MemoryBackend, Password, PasswordKdfParams,
    PersistedEntry, PersistedKeys, open_keys, seal_keys,
};
pub use entry::{AddOutcome, KeyStoreEntry, RenameOutcome, StoreKey};
pub use error::KeyStoreError;
pub use expiration::ShareExpiration;
pub use group::{GroupKeyStore, MAX_GROUP_ALIAS_LEN};
pub use store::{ChangeListener, KeyStore};
