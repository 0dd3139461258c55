//! Original (64-bit nonce, 64-bit counter) 20-round ChaCha.

use chacha20::{
    ChaCha20Legacy,
    cipher::{KeyIvInit, StreamCipher as _},
};

use super::StreamAlgorithm;
use crate::error::CipherError;

/// ChaCha20 with a 256-bit key, 64-bit nonce and block counter starting at 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Stream;

impl StreamAlgorithm for ChaCha20Stream {
    const KEY_LEN: usize = 32;
    const NONCE_LEN: usize = 8;

    fn apply_keystream(
        &self,
        key: &[u8],
        nonce: &[u8],
        data: &mut [u8],
    ) -> Result<(), CipherError> {
        let mut cipher =
            ChaCha20Legacy::new_from_slices(key, nonce).map_err(|_| CipherError::CipherFailure {
                reason: format!(
                    "expected {}-byte key and {}-byte nonce, got {} and {}",
                    Self::KEY_LEN,
                    Self::NONCE_LEN,
                    key.len(),
                    nonce.len()
                ),
            })?;
        cipher.apply_keystream(data);
        Ok(())
    }
}
