//! Per-frame nonce generation.

use crate::env::Environment;

/// Draws fixed-length nonces from an [`Environment`].
///
/// Every call is an independent random draw. There is no counter and no
/// de-duplication: at 128 bits a collision is negligible and accepted.
#[derive(Debug, Clone)]
pub struct NonceGenerator<E: Environment> {
    env: E,
    length: usize,
}

impl<E: Environment> NonceGenerator<E> {
    /// Create a generator producing nonces of `length` bytes.
    pub fn new(env: E, length: usize) -> Self {
        Self { env, length }
    }

    /// Configured nonce length in bytes.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Draw a fresh nonce directly into `out`.
    ///
    /// Fills exactly `out.len()` bytes; callers pass a slice of [`Self::length`].
    pub fn fill(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), self.length);
        self.env.random_bytes(out);
    }
}
