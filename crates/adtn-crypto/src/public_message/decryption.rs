//! Trial decryption of a frame against candidate group keys.

use tracing::{debug, trace};

use crate::{
    error::CipherError,
    frame::FrameLayout,
    group_key::GroupKey,
    primitives::{ChaCha20Stream, MacAlgorithm, Poly1305Aes, StreamAlgorithm},
};

/// Identifies which key (if any) produced a frame and recovers the block.
#[derive(Debug, Clone)]
pub struct PublicMessageDecryption<M = Poly1305Aes, S = ChaCha20Stream> {
    layout: FrameLayout,
    mac: M,
    cipher: S,
}

impl<M, S> PublicMessageDecryption<M, S>
where
    M: MacAlgorithm,
    S: StreamAlgorithm,
{
    /// Create a decryptor for frames of the given layout.
    pub fn new(layout: FrameLayout, mac: M, cipher: S) -> Self {
        Self { layout, mac, cipher }
    }

    /// Try every key in order and decrypt with the first whose MAC matches.
    ///
    /// Returns `Ok(None)` when no key matches, which is the normal outcome
    /// for traffic of other groups. A primitive failure for one key is logged
    /// and the next key is tried.
    ///
    /// # Errors
    ///
    /// - `InvalidFrameLength` if `frame` is not exactly
    ///   [`FrameLayout::total_len`] bytes
    pub fn try_decrypt(
        &self,
        frame: &[u8],
        keys: &[GroupKey],
    ) -> Result<Option<Vec<u8>>, CipherError> {
        let parts = self.layout.split(frame)?;
        let cipher_nonce =
            parts.nonce.get(..S::NONCE_LEN).ok_or_else(|| CipherError::CipherFailure {
                reason: "frame nonce shorter than cipher nonce".to_string(),
            })?;

        for (index, key) in keys.iter().enumerate() {
            match self.mac.verify(key.mac_key(), parts.nonce, parts.text, parts.mac) {
                Ok(true) => {},
                Ok(false) => {
                    trace!(key_index = index, "MAC mismatch");
                    continue;
                },
                Err(error) => {
                    debug!(key_index = index, %error, "MAC check failed, trying next key");
                    continue;
                },
            }

            let mut plaintext = parts.text.to_vec();
            match self.cipher.apply_keystream(key.cipher_key(), cipher_nonce, &mut plaintext) {
                Ok(()) => {
                    trace!(key_index = index, "frame decrypted");
                    return Ok(Some(plaintext));
                },
                Err(error) => {
                    debug!(key_index = index, %error, "decryption failed after MAC match");
                },
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{env::SystemEnv, public_message::PublicMessageEncryption};

    const LAYOUT: FrameLayout = FrameLayout::new(16, 16, 32);

    fn encrypt(block: &[u8], keys: &[GroupKey]) -> Vec<Vec<u8>> {
        PublicMessageEncryption::new(LAYOUT, SystemEnv::new(), Poly1305Aes, ChaCha20Stream)
            .encrypt(block, keys)
            .unwrap()
    }

    fn decryptor() -> PublicMessageDecryption {
        PublicMessageDecryption::new(LAYOUT, Poly1305Aes, ChaCha20Stream)
    }

    // MAC that errors for one key and delegates to Poly1305-AES otherwise
    struct FailingMac {
        bad_key: [u8; 32],
    }

    impl MacAlgorithm for FailingMac {
        const KEY_LEN: usize = Poly1305Aes::KEY_LEN;
        const NONCE_LEN: usize = Poly1305Aes::NONCE_LEN;
        const TAG_LEN: usize = Poly1305Aes::TAG_LEN;

        fn compute(
            &self,
            key: &[u8],
            nonce: &[u8],
            message: &[u8],
            tag: &mut [u8],
        ) -> Result<(), CipherError> {
            Poly1305Aes.compute(key, nonce, message, tag)
        }

        fn verify(
            &self,
            key: &[u8],
            nonce: &[u8],
            message: &[u8],
            expected: &[u8],
        ) -> Result<bool, CipherError> {
            if key == self.bad_key.as_slice() {
                return Err(CipherError::MacFailure { reason: "injected".to_string() });
            }
            Poly1305Aes.verify(key, nonce, message, expected)
        }
    }

    // MAC that accepts one key unconditionally
    struct AcceptingMac {
        accepted_key: [u8; 32],
    }

    impl MacAlgorithm for AcceptingMac {
        const KEY_LEN: usize = Poly1305Aes::KEY_LEN;
        const NONCE_LEN: usize = Poly1305Aes::NONCE_LEN;
        const TAG_LEN: usize = Poly1305Aes::TAG_LEN;

        fn compute(
            &self,
            key: &[u8],
            nonce: &[u8],
            message: &[u8],
            tag: &mut [u8],
        ) -> Result<(), CipherError> {
            Poly1305Aes.compute(key, nonce, message, tag)
        }

        fn verify(
            &self,
            key: &[u8],
            nonce: &[u8],
            message: &[u8],
            expected: &[u8],
        ) -> Result<bool, CipherError> {
            if key == self.accepted_key.as_slice() {
                return Ok(true);
            }
            Poly1305Aes.verify(key, nonce, message, expected)
        }
    }

    // Stream cipher that errors for one key and delegates to ChaCha20 otherwise
    struct FailingStream {
        bad_key: [u8; 32],
    }

    impl StreamAlgorithm for FailingStream {
        const KEY_LEN: usize = ChaCha20Stream::KEY_LEN;
        const NONCE_LEN: usize = ChaCha20Stream::NONCE_LEN;

        fn apply_keystream(
            &self,
            key: &[u8],
            nonce: &[u8],
            data: &mut [u8],
        ) -> Result<(), CipherError> {
            if key == self.bad_key.as_slice() {
                return Err(CipherError::CipherFailure { reason: "injected".to_string() });
            }
            ChaCha20Stream.apply_keystream(key, nonce, data)
        }
    }

    fn two_keys() -> (GroupKey, GroupKey) {
        let env = SystemEnv::new();
        (GroupKey::generate(&env), GroupKey::generate(&env))
    }

    #[test]
    fn mac_error_for_one_key_moves_on_to_the_next() {
        let (first, second) = two_keys();
        let block = [0x42u8; 32];
        let frame = encrypt(&block, std::slice::from_ref(&second)).remove(0);

        let bad_key = *first.mac_key();
        let decryptor =
            PublicMessageDecryption::new(LAYOUT, FailingMac { bad_key }, ChaCha20Stream);

        let plaintext = decryptor.try_decrypt(&frame, &[first, second]).unwrap();
        assert_eq!(plaintext.as_deref(), Some(&block[..]));
    }

    #[test]
    fn keystream_error_after_mac_match_moves_on_to_the_next() {
        let (first, second) = two_keys();
        let block = [0x24u8; 32];
        let frame = encrypt(&block, std::slice::from_ref(&second)).remove(0);

        let mac = AcceptingMac { accepted_key: *first.mac_key() };
        let stream = FailingStream { bad_key: *first.cipher_key() };
        let decryptor = PublicMessageDecryption::new(LAYOUT, mac, stream);

        let plaintext = decryptor.try_decrypt(&frame, &[first, second]).unwrap();
        assert_eq!(plaintext.as_deref(), Some(&block[..]));
    }

    #[test]
    fn mac_error_for_every_key_is_no_match() {
        let key = GroupKey::generate(&SystemEnv::new());
        let frame = encrypt(&[0u8; 32], std::slice::from_ref(&key)).remove(0);

        let bad_key = *key.mac_key();
        let decryptor =
            PublicMessageDecryption::new(LAYOUT, FailingMac { bad_key }, ChaCha20Stream);

        assert_eq!(decryptor.try_decrypt(&frame, &[key]).unwrap(), None);
    }

    #[test]
    fn decrypts_with_matching_key() {
        let key = GroupKey::generate(&SystemEnv::new());
        let block = [0x5Au8; 32];
        let frames = encrypt(&block, std::slice::from_ref(&key));

        let plaintext = decryptor().try_decrypt(&frames[0], &[key]).unwrap();
        assert_eq!(plaintext.as_deref(), Some(&block[..]));
    }

    #[test]
    fn finds_key_anywhere_in_collection() {
        let env = SystemEnv::new();
        let keys: Vec<_> = (0..5).map(|_| GroupKey::generate(&env)).collect();
        let block = [3u8; 32];
        let frames = encrypt(&block, &keys[3..4]);

        let plaintext = decryptor().try_decrypt(&frames[0], &keys).unwrap();
        assert_eq!(plaintext.as_deref(), Some(&block[..]));
    }

    #[test]
    fn foreign_key_is_no_match() {
        let env = SystemEnv::new();
        let sender = GroupKey::generate(&env);
        let other = GroupKey::generate(&env);
        let frames = encrypt(&[0u8; 32], &[sender]);

        assert_eq!(decryptor().try_decrypt(&frames[0], &[other]).unwrap(), None);
    }

    #[test]
    fn empty_key_collection_is_no_match() {
        let key = GroupKey::generate(&SystemEnv::new());
        let frames = encrypt(&[0u8; 32], &[key]);

        assert_eq!(decryptor().try_decrypt(&frames[0], &[]).unwrap(), None);
    }

    #[test]
    fn tampered_ciphertext_is_no_match() {
        let key = GroupKey::generate(&SystemEnv::new());
        let mut frame = encrypt(&[0u8; 32], std::slice::from_ref(&key)).remove(0);
        frame[40] ^= 0x01;

        assert_eq!(decryptor().try_decrypt(&frame, &[key]).unwrap(), None);
    }

    #[test]
    fn tampered_nonce_is_no_match() {
        let key = GroupKey::generate(&SystemEnv::new());
        let mut frame = encrypt(&[0u8; 32], std::slice::from_ref(&key)).remove(0);
        frame[20] ^= 0x80;

        assert_eq!(decryptor().try_decrypt(&frame, &[key]).unwrap(), None);
    }

    #[test]
    fn wrong_frame_length_fails_fast() {
        let key = GroupKey::generate(&SystemEnv::new());
        let result = decryptor().try_decrypt(&[0u8; 63], &[key]);

        assert_eq!(result, Err(CipherError::InvalidFrameLength { expected: 64, actual: 63 }));
    }
}
