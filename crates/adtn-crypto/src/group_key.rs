//! Group key: the cipher key and MAC key shared by every member of a group.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{env::Environment, error::CipherError};

/// Stream cipher key size in bytes (256 bits)
pub const CIPHER_KEY_SIZE: usize = 32;

/// MAC key size in bytes (256 bits: 128-bit `r` followed by 128-bit AES key)
pub const MAC_KEY_SIZE: usize = 32;

/// Size of an encoded group key: `cipher_key || mac_key`
pub const ENCODED_KEY_SIZE: usize = CIPHER_KEY_SIZE + MAC_KEY_SIZE;

/// Symmetric key material of a broadcast group.
///
/// Immutable once constructed. Equality is equality of the encoded bytes,
/// compared in constant time.
///
/// # Invariants
///
/// - `decode(encode(k)) == k` for every key
/// - Encoded form is exactly [`ENCODED_KEY_SIZE`] bytes
#[derive(Clone)]
pub struct GroupKey {
    cipher_key: [u8; CIPHER_KEY_SIZE],
    mac_key: [u8; MAC_KEY_SIZE],
}

impl GroupKey {
    /// Build a key from its two halves.
    ///
    /// # Errors
    ///
    /// - `WeakMacKey` if the `r` half of `mac_key` is zero once clamped
    pub fn from_parts(
        cipher_key: [u8; CIPHER_KEY_SIZE],
        mac_key: [u8; MAC_KEY_SIZE],
    ) -> Result<Self, CipherError> {
        if clamped_r_is_zero(&mac_key) {
            return Err(CipherError::WeakMacKey);
        }
        Ok(Self { cipher_key, mac_key })
    }

    /// Generate a fresh key.
    ///
    /// Both halves are drawn independently. The `r` half of the MAC key is
    /// clamped as Poly1305 key generators do, so the stored key is already in
    /// canonical form.
    pub fn generate(env: &impl Environment) -> Self {
        let mut cipher_key = [0u8; CIPHER_KEY_SIZE];
        let mut mac_key = [0u8; MAC_KEY_SIZE];
        env.random_bytes(&mut cipher_key);
        loop {
            env.random_bytes(&mut mac_key);
            clamp_poly1305_r(&mut mac_key);
            if !clamped_r_is_zero(&mac_key) {
                break;
            }
        }

        Self { cipher_key, mac_key }
    }

    /// Decode a key from `cipher_key || mac_key`.
    ///
    /// # Errors
    ///
    /// - `MalformedKey` if `bytes` is not exactly [`ENCODED_KEY_SIZE`] long
    /// - `WeakMacKey` if the `r` half of the MAC key is zero once clamped
    pub fn decode(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() != ENCODED_KEY_SIZE {
            return Err(CipherError::MalformedKey {
                expected: ENCODED_KEY_SIZE,
                actual: bytes.len(),
            });
        }

        let (cipher_part, mac_part) = bytes.split_at(CIPHER_KEY_SIZE);
        let mut cipher_key = [0u8; CIPHER_KEY_SIZE];
        let mut mac_key = [0u8; MAC_KEY_SIZE];
        cipher_key.copy_from_slice(cipher_part);
        mac_key.copy_from_slice(mac_part);

        Self::from_parts(cipher_key, mac_key)
    }

    /// Encode as `cipher_key || mac_key`.
    pub fn encode(&self) -> [u8; ENCODED_KEY_SIZE] {
        let mut out = [0u8; ENCODED_KEY_SIZE];
        out[..CIPHER_KEY_SIZE].copy_from_slice(&self.cipher_key);
        out[CIPHER_KEY_SIZE..].copy_from_slice(&self.mac_key);
        out
    }

    /// Key for the stream cipher.
    pub fn cipher_key(&self) -> &[u8; CIPHER_KEY_SIZE] {
        &self.cipher_key
    }

    /// Key for the MAC.
    pub fn mac_key(&self) -> &[u8; MAC_KEY_SIZE] {
        &self.mac_key
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.encode().ct_eq(&other.encode()).into()
    }
}

impl Eq for GroupKey {}

impl fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupKey").finish_non_exhaustive()
    }
}

impl Drop for GroupKey {
    fn drop(&mut self) {
        self.cipher_key.zeroize();
        self.mac_key.zeroize();
    }
}

/// Clear the bits Poly1305 ignores in `r` (first 16 bytes of the MAC key).
fn clamp_poly1305_r(mac_key: &mut [u8; MAC_KEY_SIZE]) {
    if let Some(r) = mac_key.first_chunk_mut::<16>() {
        clamp_poly1305_r_block(r);
    }
}

fn clamp_poly1305_r_block(r: &mut [u8; 16]) {
    for i in [3, 7, 11, 15] {
        r[i] &= 0x0f;
    }
    for i in [4, 8, 12] {
        r[i] &= 0xfc;
    }
}

// With r = 0 the tag is AES_k(nonce) for every message.
fn clamped_r_is_zero(mac_key: &[u8; MAC_KEY_SIZE]) -> bool {
    let mut r = [0u8; 16];
    r.copy_from_slice(&mac_key[..16]);
    clamp_poly1305_r_block(&mut r);
    let zero: bool = r.ct_eq(&[0u8; 16]).into();
    r.zeroize();
    zero
}
