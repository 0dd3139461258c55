//! Error types for packet building and transport

use adtn_crypto::CipherError;
use thiserror::Error;

use crate::socket::SocketError;

/// Errors from the packet layer
///
/// An undecryptable or malformed incoming packet is NOT an error. The builder
/// reports it as an empty payload so hostile traffic behaves exactly like
/// traffic of a foreign group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Outgoing message exceeds the configured maximum
    #[error("message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge {
        /// Message length
        size: usize,
        /// Configured maximum message size
        max: usize,
    },

    /// Maximum message size cannot be represented by the 2-byte header
    #[error("invalid maximum message size: {0}")]
    InvalidMaxMessageSize(usize),

    /// Cipher block size does not match the packet configuration
    #[error("cipher plaintext size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Unencrypted packet size required by the builder
        expected: usize,
        /// Plaintext size of the supplied cipher
        actual: usize,
    },

    /// Preference value outside its valid range
    #[error("invalid preference {name}: {value}")]
    InvalidPreference {
        /// Preference name
        name: &'static str,
        /// Rejected value
        value: u64,
    },

    /// Cipher rejected an operation
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Transport failed
    #[error(transparent)]
    Socket(#[from] SocketError),
}

impl PacketError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Configuration errors and a closed socket are fatal. An oversized
    /// message only fails that one call.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidMaxMessageSize(_) => true,
            Self::SizeMismatch { .. } => true,
            Self::Cipher(err) => err.is_fatal(),
            Self::Socket(err) => err.is_fatal(),

            Self::MessageTooLarge { .. } => false,
            Self::InvalidPreference { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_message_is_not_fatal() {
        let err = PacketError::MessageTooLarge { size: 1454, max: 1453 };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "message too large: 1454 bytes exceeds maximum 1453");
    }

    #[test]
    fn configuration_errors_are_fatal() {
        assert!(PacketError::InvalidMaxMessageSize(0).is_fatal());
        assert!(PacketError::SizeMismatch { expected: 1455, actual: 12 }.is_fatal());
    }

    #[test]
    fn cipher_fatality_is_forwarded() {
        let fatal = PacketError::from(CipherError::InvalidConfiguration("x".into()));
        let benign = PacketError::from(CipherError::MalformedKey { expected: 64, actual: 1 });

        assert!(fatal.is_fatal());
        assert!(!benign.is_fatal());
    }

    #[test]
    fn closed_socket_is_fatal() {
        assert!(PacketError::from(SocketError::Closed).is_fatal());
    }
}
