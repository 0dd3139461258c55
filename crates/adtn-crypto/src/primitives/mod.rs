//! MAC and stream cipher strategies.
//!
//! The public-message encryptor and decryptor are generic over these two
//! traits. The deployed algorithm pair is fixed per build:
//! [`Poly1305Aes`] and [`ChaCha20Stream`].

mod cipher;
mod mac;

pub use cipher::ChaCha20Stream;
pub use mac::Poly1305Aes;

use crate::error::CipherError;

/// One-time-authenticator keyed by a secret key and a per-message nonce.
pub trait MacAlgorithm: Send + Sync {
    /// Key length in bytes
    const KEY_LEN: usize;

    /// Nonce length in bytes
    const NONCE_LEN: usize;

    /// Tag length in bytes
    const TAG_LEN: usize;

    /// Authenticate `message` and write the tag into `tag`.
    ///
    /// # Errors
    ///
    /// - `MacFailure` if `key`, `nonce` or `tag` has the wrong length
    fn compute(
        &self,
        key: &[u8],
        nonce: &[u8],
        message: &[u8],
        tag: &mut [u8],
    ) -> Result<(), CipherError>;

    /// Recompute the tag for `message` and compare it with `expected` in
    /// constant time.
    ///
    /// # Errors
    ///
    /// - `MacFailure` if `key` or `nonce` has the wrong length
    fn verify(
        &self,
        key: &[u8],
        nonce: &[u8],
        message: &[u8],
        expected: &[u8],
    ) -> Result<bool, CipherError>;
}

/// Length-preserving stream cipher.
pub trait StreamAlgorithm: Send + Sync {
    /// Key length in bytes
    const KEY_LEN: usize;

    /// Nonce length in bytes
    const NONCE_LEN: usize;

    /// XOR the keystream for `(key, nonce)` into `data`, starting at block 0.
    ///
    /// Encryption and decryption are the same operation.
    ///
    /// # Errors
    ///
    /// - `CipherFailure` if `key` or `nonce` has the wrong length
    fn apply_keystream(&self, key: &[u8], nonce: &[u8], data: &mut [u8])
    -> Result<(), CipherError>;
}
