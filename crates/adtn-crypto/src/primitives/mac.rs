//! Poly1305-AES one-time authenticator.
//!
//! The 32-byte MAC key is `r || k`. The tag of message `m` under nonce `n` is
//! `(Poly1305_r(m) + AES-128_k(n)) mod 2^128`, which is Poly1305 keyed with
//! `r || AES-128_k(n)`.

use aes::{
    Aes128,
    cipher::{BlockEncrypt, KeyInit},
};
use poly1305::Poly1305;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::MacAlgorithm;
use crate::error::CipherError;

const R_LEN: usize = 16;
const AES_KEY_LEN: usize = 16;
const TAG_LEN: usize = 16;

/// Poly1305-AES with 128-bit nonces and 128-bit tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Poly1305Aes;

impl Poly1305Aes {
    fn tag(key: &[u8], nonce: &[u8], message: &[u8]) -> Result<[u8; TAG_LEN], CipherError> {
        if key.len() != Self::KEY_LEN {
            return Err(CipherError::MacFailure {
                reason: format!("key must be {} bytes, got {}", Self::KEY_LEN, key.len()),
            });
        }
        if nonce.len() != Self::NONCE_LEN {
            return Err(CipherError::MacFailure {
                reason: format!("nonce must be {} bytes, got {}", Self::NONCE_LEN, nonce.len()),
            });
        }

        let (r, k) = key.split_at(R_LEN);
        debug_assert_eq!(k.len(), AES_KEY_LEN);

        let aes = <Aes128 as KeyInit>::new_from_slice(k).map_err(|_| CipherError::MacFailure {
            reason: "AES key rejected".to_string(),
        })?;
        let mut s = aes::Block::clone_from_slice(nonce);
        aes.encrypt_block(&mut s);

        let mut one_time_key = [0u8; R_LEN + TAG_LEN];
        one_time_key[..R_LEN].copy_from_slice(r);
        one_time_key[R_LEN..].copy_from_slice(&s);
        s.as_mut_slice().zeroize();

        let poly = <Poly1305 as poly1305::universal_hash::KeyInit>::new_from_slice(&one_time_key);
        one_time_key.zeroize();
        let poly = poly.map_err(|_| CipherError::MacFailure {
            reason: "Poly1305 key rejected".to_string(),
        })?;

        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&poly.compute_unpadded(message));
        Ok(tag)
    }
}

impl MacAlgorithm for Poly1305Aes {
    const KEY_LEN: usize = R_LEN + AES_KEY_LEN;
    const NONCE_LEN: usize = 16;
    const TAG_LEN: usize = TAG_LEN;

    fn compute(
        &self,
        key: &[u8],
        nonce: &[u8],
        message: &[u8],
        tag: &mut [u8],
    ) -> Result<(), CipherError> {
        if tag.len() != TAG_LEN {
            return Err(CipherError::MacFailure {
                reason: format!("tag buffer must be {TAG_LEN} bytes, got {}", tag.len()),
            });
        }
        tag.copy_from_slice(&Self::tag(key, nonce, message)?);
        Ok(())
    }

    fn verify(
        &self,
        key: &[u8],
        nonce: &[u8],
        message: &[u8],
        expected: &[u8],
    ) -> Result<bool, CipherError> {
        let tag = Self::tag(key, nonce, message)?;
        // Length mismatch is already a non-match; ct_eq on slices handles it.
        Ok(tag.as_slice().ct_eq(expected).into())
    }
}
