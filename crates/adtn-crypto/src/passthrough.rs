//! Debug cipher that leaves the plaintext readable on the wire.
//!
//! Frames are `MAGIC || plaintext`. Decryption succeeds for any frame that
//! starts with the magic bytes, regardless of the keys supplied. Use it to
//! inspect packet traffic while debugging, never in production.

use crate::{
    env::{Environment, SystemEnv},
    error::CipherError,
    suite::GroupCipher,
};

/// Prefix marking a passthrough frame
pub const MAGIC: [u8; 8] = [0xC8, 0xAA, 0xEC, 0x31, 0x08, 0x04, 0xB6, 0xB4];

/// Passthrough key: a single opaque byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassthroughKey(pub u8);

/// Group cipher that performs no encryption.
#[derive(Debug, Clone)]
pub struct PassthroughCipher<E: Environment = SystemEnv> {
    plaintext_size: usize,
    env: E,
}

impl PassthroughCipher<SystemEnv> {
    /// Create a passthrough cipher for blocks of `plaintext_size` bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if `plaintext_size` is zero
    pub fn new(plaintext_size: usize) -> Result<Self, CipherError> {
        Self::with_env(plaintext_size, SystemEnv::new())
    }
}

impl<E: Environment> PassthroughCipher<E> {
    /// Create a passthrough cipher with an explicit environment.
    pub fn with_env(plaintext_size: usize, env: E) -> Result<Self, CipherError> {
        if plaintext_size == 0 || plaintext_size.checked_add(MAGIC.len()).is_none() {
            return Err(CipherError::InvalidConfiguration(format!(
                "invalid plaintext size {plaintext_size}"
            )));
        }
        Ok(Self { plaintext_size, env })
    }
}

impl<E: Environment> GroupCipher for PassthroughCipher<E> {
    type Key = PassthroughKey;

    fn ciphertext_size(&self) -> usize {
        MAGIC.len() + self.plaintext_size
    }

    fn plaintext_size(&self) -> usize {
        self.plaintext_size
    }

    fn generate_key(&self) -> PassthroughKey {
        let mut byte = [0u8; 1];
        self.env.random_bytes(&mut byte);
        PassthroughKey(byte[0])
    }

    fn encrypt(
        &self,
        plaintext: &[u8],
        keys: &[PassthroughKey],
    ) -> Result<Vec<Vec<u8>>, CipherError> {
        if plaintext.len() != self.plaintext_size {
            return Err(CipherError::InvalidPlaintextLength {
                expected: self.plaintext_size,
                actual: plaintext.len(),
            });
        }

        let mut frame = Vec::with_capacity(self.ciphertext_size());
        frame.extend_from_slice(&MAGIC);
        frame.extend_from_slice(plaintext);

        Ok(vec![frame; keys.len()])
    }

    fn try_decrypt(
        &self,
        ciphertext: &[u8],
        _keys: &[PassthroughKey],
    ) -> Result<Option<Vec<u8>>, CipherError> {
        if ciphertext.len() != self.ciphertext_size() {
            return Err(CipherError::InvalidFrameLength {
                expected: self.ciphertext_size(),
                actual: ciphertext.len(),
            });
        }

        Ok(ciphertext.strip_prefix(&MAGIC[..]).map(<[u8]>::to_vec))
    }

    fn encode_key(&self, key: &PassthroughKey) -> Vec<u8> {
        vec![key.0]
    }

    fn decode_key(&self, bytes: &[u8]) -> Result<PassthroughKey, CipherError> {
        match bytes {
            [byte] => Ok(PassthroughKey(*byte)),
            _ => Err(CipherError::MalformedKey { expected: 1, actual: bytes.len() }),
        }
    }

    fn encoded_key_size(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_magic_then_plaintext() {
        let cipher = PassthroughCipher::new(4).unwrap();
        let frames = cipher.encrypt(b"test", &[PassthroughKey(1)]).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][..8], &MAGIC);
        assert_eq!(&frames[0][8..], b"test");
    }

    #[test]
    fn one_frame_per_key() {
        let cipher = PassthroughCipher::new(2).unwrap();
        let frames = cipher.encrypt(b"ab", &[PassthroughKey(1), PassthroughKey(2)]).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn decrypt_ignores_keys() {
        let cipher = PassthroughCipher::new(4).unwrap();
        let frames = cipher.encrypt(b"test", &[PassthroughKey(1)]).unwrap();

        assert_eq!(cipher.try_decrypt(&frames[0], &[]).unwrap(), Some(b"test".to_vec()));
    }

    #[test]
    fn missing_magic_is_no_match() {
        let cipher = PassthroughCipher::new(4).unwrap();
        assert_eq!(cipher.try_decrypt(&[0u8; 12], &[PassthroughKey(1)]).unwrap(), None);
    }

    #[test]
    fn wrong_frame_length_is_rejected() {
        let cipher = PassthroughCipher::new(4).unwrap();
        let result = cipher.try_decrypt(&MAGIC, &[]);
        assert_eq!(result, Err(CipherError::InvalidFrameLength { expected: 12, actual: 8 }));
    }

    #[test]
    fn key_codec() {
        let cipher = PassthroughCipher::new(4).unwrap();
        let key = cipher.generate_key();

        assert_eq!(cipher.decode_key(&cipher.encode_key(&key)).unwrap(), key);
        assert!(cipher.decode_key(&[1, 2]).is_err());
    }
}
