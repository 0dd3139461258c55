//! Frame production: one frame per group key.

use crate::{
    env::Environment,
    error::CipherError,
    frame::FrameLayout,
    group_key::GroupKey,
    nonce::NonceGenerator,
    primitives::{ChaCha20Stream, MacAlgorithm, Poly1305Aes, StreamAlgorithm},
};

/// Encrypts plaintext blocks into frames.
///
/// Holds no mutable state besides the environment's entropy source, so one
/// instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct PublicMessageEncryption<E: Environment, M = Poly1305Aes, S = ChaCha20Stream> {
    layout: FrameLayout,
    nonces: NonceGenerator<E>,
    mac: M,
    cipher: S,
}

impl<E, M, S> PublicMessageEncryption<E, M, S>
where
    E: Environment,
    M: MacAlgorithm,
    S: StreamAlgorithm,
{
    /// Create an encryptor for frames of the given layout.
    ///
    /// The layout's nonce field must be [`MacAlgorithm::NONCE_LEN`] long and
    /// at least [`StreamAlgorithm::NONCE_LEN`]; the suite guarantees this.
    pub fn new(layout: FrameLayout, env: E, mac: M, cipher: S) -> Self {
        debug_assert_eq!(layout.mac_range().len(), M::TAG_LEN);
        debug_assert_eq!(layout.nonce_range().len(), M::NONCE_LEN);
        debug_assert!(M::NONCE_LEN >= S::NONCE_LEN);

        Self { layout, nonces: NonceGenerator::new(env, M::NONCE_LEN), mac, cipher }
    }

    /// Encrypt `plaintext` once per key.
    ///
    /// Returns exactly `keys.len()` frames in key order, each
    /// [`FrameLayout::total_len`] bytes. An empty key slice yields no frames.
    ///
    /// # Errors
    ///
    /// - `InvalidPlaintextLength` if `plaintext` is not exactly the configured
    ///   block size
    /// - `MacFailure` / `CipherFailure` if a primitive rejects its inputs
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        keys: &[GroupKey],
    ) -> Result<Vec<Vec<u8>>, CipherError> {
        if plaintext.len() != self.layout.text_len() {
            return Err(CipherError::InvalidPlaintextLength {
                expected: self.layout.text_len(),
                actual: plaintext.len(),
            });
        }

        keys.iter().map(|key| self.encrypt_one(plaintext, key)).collect()
    }

    fn encrypt_one(&self, plaintext: &[u8], key: &GroupKey) -> Result<Vec<u8>, CipherError> {
        let mut frame = vec![0u8; self.layout.total_len()];
        let parts = self.layout.split_mut(&mut frame)?;

        // INVARIANT: fresh nonce per key, never shared between frames
        self.nonces.fill(parts.nonce);

        let cipher_nonce =
            parts.nonce.get(..S::NONCE_LEN).ok_or_else(|| CipherError::CipherFailure {
                reason: "frame nonce shorter than cipher nonce".to_string(),
            })?;

        parts.text.copy_from_slice(plaintext);
        self.cipher.apply_keystream(key.cipher_key(), cipher_nonce, parts.text)?;
        self.mac.compute(key.mac_key(), parts.nonce, parts.text, parts.mac)?;

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SystemEnv;

    fn encryptor(text_len: usize) -> PublicMessageEncryption<SystemEnv> {
        PublicMessageEncryption::new(
            FrameLayout::new(16, 16, text_len),
            SystemEnv::new(),
            Poly1305Aes,
            ChaCha20Stream,
        )
    }

    #[test]
    fn one_frame_per_key() {
        let env = SystemEnv::new();
        let keys: Vec<_> = (0..3).map(|_| GroupKey::generate(&env)).collect();

        let frames = encryptor(8).encrypt(&[0u8; 8], &keys).unwrap();

        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.len() == 40));
    }

    #[test]
    fn no_keys_no_frames() {
        let frames = encryptor(8).encrypt(&[0u8; 8], &[]).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn same_key_twice_gets_distinct_nonces() {
        let key = GroupKey::generate(&SystemEnv::new());
        let keys = [key.clone(), key];

        let frames = encryptor(8).encrypt(b"12345678", &keys).unwrap();

        assert_ne!(frames[0][16..32], frames[1][16..32]);
        assert_ne!(frames[0][32..], frames[1][32..]);
    }

    #[test]
    fn plaintext_does_not_appear_in_frame() {
        let key = GroupKey::generate(&SystemEnv::new());
        let block = [0xAAu8; 64];

        let frames = encryptor(64).encrypt(&block, &[key]).unwrap();

        assert_ne!(&frames[0][32..], &block[..]);
    }

    #[test]
    fn wrong_plaintext_length_is_rejected() {
        let key = GroupKey::generate(&SystemEnv::new());
        let result = encryptor(8).encrypt(&[0u8; 7], &[key]);

        assert_eq!(result, Err(CipherError::InvalidPlaintextLength { expected: 8, actual: 7 }));
    }
}
