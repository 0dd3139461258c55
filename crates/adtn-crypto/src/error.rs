//! Error types for group cipher operations
//!
//! "No key in the collection decrypts this packet" is NOT an error. It is the
//! common case for overheard broadcast traffic and is reported as `None` by
//! [`crate::GroupCipher::try_decrypt`].

use thiserror::Error;

/// Errors from group cipher operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Encoded key has the wrong length
    #[error("malformed key: expected {expected} bytes, got {actual}")]
    MalformedKey {
        /// Expected encoded key length
        expected: usize,
        /// Actual encoded key length
        actual: usize,
    },

    /// MAC key whose clamped `r` half is zero; every tag would ignore the
    /// message
    #[error("weak MAC key: Poly1305 r is zero after clamping")]
    WeakMacKey,

    /// Frame handed to the decryptor has the wrong total length
    #[error("invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidFrameLength {
        /// Configured frame length
        expected: usize,
        /// Actual frame length
        actual: usize,
    },

    /// Plaintext handed to the encryptor has the wrong length
    #[error("invalid plaintext length: expected {expected} bytes, got {actual}")]
    InvalidPlaintextLength {
        /// Configured plaintext length
        expected: usize,
        /// Actual plaintext length
        actual: usize,
    },

    /// The suite cannot be built with the requested parameters
    #[error("invalid cipher configuration: {0}")]
    InvalidConfiguration(String),

    /// MAC primitive rejected its inputs
    #[error("MAC computation failed: {reason}")]
    MacFailure {
        /// Reason for the failure
        reason: String,
    },

    /// Stream cipher primitive rejected its inputs
    #[error("stream cipher failed: {reason}")]
    CipherFailure {
        /// Reason for the failure
        reason: String,
    },
}

impl CipherError {
    /// Returns true if this error is fatal (unrecoverable)
    ///
    /// Fatal errors mean the suite itself is unusable. The remaining errors are
    /// caller-contract violations: the call was wrong, the suite is fine.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidConfiguration(_) => true,
            Self::MacFailure { .. } => true,
            Self::CipherFailure { .. } => true,

            Self::MalformedKey { .. } => false,
            Self::WeakMacKey => false,
            Self::InvalidFrameLength { .. } => false,
            Self::InvalidPlaintextLength { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_is_fatal() {
        let err = CipherError::InvalidConfiguration("plaintext size must be non-zero".into());
        assert!(err.is_fatal());
    }

    #[test]
    fn contract_violations_are_not_fatal() {
        assert!(!CipherError::MalformedKey { expected: 64, actual: 63 }.is_fatal());
        assert!(!CipherError::WeakMacKey.is_fatal());
        assert!(!CipherError::InvalidFrameLength { expected: 1487, actual: 10 }.is_fatal());
        assert!(!CipherError::InvalidPlaintextLength { expected: 1455, actual: 0 }.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = CipherError::MalformedKey { expected: 64, actual: 12 };
        assert_eq!(err.to_string(), "malformed key: expected 64 bytes, got 12");
    }
}
