//! Key store errors
//!
//! Conflicts on add or rename are NOT errors. They are reported through
//! [`crate::AddOutcome`] and [`crate::RenameOutcome`].

use adtn_crypto::CipherError;
use thiserror::Error;

/// Errors from key stores and their persistence backends
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyStoreError {
    /// Password does not unlock the key store file
    #[error("wrong password")]
    WrongPassword,

    /// Empty passwords are not accepted
    #[error("password must not be empty")]
    EmptyPassword,

    /// Alias exceeds the allowed length
    #[error("alias too long: {len} characters exceeds maximum {max}")]
    AliasTooLong {
        /// Alias length in characters
        len: usize,
        /// Maximum alias length
        max: usize,
    },

    /// Alias is empty
    #[error("alias must not be empty")]
    EmptyAlias,

    /// Persisted data is structurally invalid
    #[error("key store corrupted: {0}")]
    Corrupted(String),

    /// Serialization of the key list failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Persisted key bytes do not decode
    #[error(transparent)]
    Key(#[from] CipherError),

    /// Password hashing parameters rejected
    #[error("invalid key derivation parameters: {0}")]
    InvalidKdfParams(String),

    /// No identifiers left to allocate
    #[error("key ID space exhausted")]
    IdSpaceExhausted,
}

impl KeyStoreError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Fatal errors mean the store cannot be opened or written. Validation
    /// errors only reject the one call.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Corrupted(_) => true,
            Self::Io(_) => true,
            Self::Serialization(_) => true,
            Self::Key(_) => true,
            Self::IdSpaceExhausted => true,
            Self::InvalidKdfParams(_) => true,

            Self::WrongPassword => false,
            Self::EmptyPassword => false,
            Self::AliasTooLong { .. } => false,
            Self::EmptyAlias => false,
        }
    }
}

impl From<std::io::Error> for KeyStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
