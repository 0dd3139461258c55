//! Group cipher abstraction and the deployed cipher suite.

use std::fmt;

use crate::{
    env::{Environment, SystemEnv},
    error::CipherError,
    frame::FrameLayout,
    group_key::{ENCODED_KEY_SIZE, GroupKey},
    primitives::{ChaCha20Stream, MacAlgorithm, Poly1305Aes, StreamAlgorithm},
    public_message::{PublicMessageDecryption, PublicMessageEncryption},
};

/// MAC field length in a frame
pub const MAC_LEN: usize = <Poly1305Aes as MacAlgorithm>::TAG_LEN;

/// Nonce field length in a frame
pub const NONCE_LEN: usize = <Poly1305Aes as MacAlgorithm>::NONCE_LEN;

/// Prefix of the nonce field consumed by the stream cipher
pub const CIPHER_NONCE_LEN: usize = <ChaCha20Stream as StreamAlgorithm>::NONCE_LEN;

/// Bytes a frame adds on top of the plaintext block
pub const FRAME_OVERHEAD: usize = MAC_LEN + NONCE_LEN;

/// Fixed-size block cipher for broadcast groups.
///
/// This is the seam the packet layer is written against. Implementations turn
/// a plaintext block of [`plaintext_size`](Self::plaintext_size) bytes into
/// one frame of [`ciphertext_size`](Self::ciphertext_size) bytes per key, and
/// back.
pub trait GroupCipher: Send + Sync {
    /// Key type shared by members of a group
    type Key: Clone + Eq + fmt::Debug + Send + Sync;

    /// Length of every frame produced by [`encrypt`](Self::encrypt).
    fn ciphertext_size(&self) -> usize;

    /// Length of the plaintext block accepted by [`encrypt`](Self::encrypt).
    fn plaintext_size(&self) -> usize;

    /// Generate a fresh group key.
    fn generate_key(&self) -> Self::Key;

    /// Encrypt one block once per key, in key order.
    fn encrypt(&self, plaintext: &[u8], keys: &[Self::Key]) -> Result<Vec<Vec<u8>>, CipherError>;

    /// Decrypt a frame with the first matching key.
    ///
    /// `Ok(None)` means no key matched. That is the normal outcome for frames
    /// of other groups and not an error.
    fn try_decrypt(
        &self,
        ciphertext: &[u8],
        keys: &[Self::Key],
    ) -> Result<Option<Vec<u8>>, CipherError>;

    /// Serialize a key.
    fn encode_key(&self, key: &Self::Key) -> Vec<u8>;

    /// Deserialize a key produced by [`encode_key`](Self::encode_key).
    fn decode_key(&self, bytes: &[u8]) -> Result<Self::Key, CipherError>;

    /// Length of an encoded key.
    fn encoded_key_size(&self) -> usize;
}

/// ChaCha20 + Poly1305-AES group cipher suite.
///
/// Frames are `MAC (16) || nonce (16) || ciphertext (plaintext_size)`.
///
/// # Invariants
///
/// - `ciphertext_size() == plaintext_size() + 32` for every frame
/// - Stateless between calls: concurrent use from several threads is safe
#[derive(Debug, Clone)]
pub struct GroupCipherSuite<E: Environment = SystemEnv> {
    layout: FrameLayout,
    env: E,
    encryption: PublicMessageEncryption<E>,
    decryption: PublicMessageDecryption,
}

impl GroupCipherSuite<SystemEnv> {
    /// Build the suite with OS randomness.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if `plaintext_size` is zero
    pub fn new(plaintext_size: usize) -> Result<Self, CipherError> {
        Self::with_env(plaintext_size, SystemEnv::new())
    }
}

impl<E: Environment> GroupCipherSuite<E> {
    /// Build the suite with an explicit environment.
    ///
    /// # Errors
    ///
    /// - `InvalidConfiguration` if `plaintext_size` is zero or the frame size
    ///   overflows `usize`
    pub fn with_env(plaintext_size: usize, env: E) -> Result<Self, CipherError> {
        if plaintext_size == 0 {
            return Err(CipherError::InvalidConfiguration(
                "plaintext size must be non-zero".to_string(),
            ));
        }
        if plaintext_size.checked_add(FRAME_OVERHEAD).is_none() {
            return Err(CipherError::InvalidConfiguration(format!(
                "plaintext size {plaintext_size} overflows the frame length"
            )));
        }

        let layout = FrameLayout::new(MAC_LEN, NONCE_LEN, plaintext_size);
        Ok(Self {
            layout,
            encryption: PublicMessageEncryption::new(
                layout,
                env.clone(),
                Poly1305Aes,
                ChaCha20Stream,
            ),
            decryption: PublicMessageDecryption::new(layout, Poly1305Aes, ChaCha20Stream),
            env,
        })
    }

    /// Frame layout used by this suite.
    pub fn layout(&self) -> FrameLayout {
        self.layout
    }
}

impl<E: Environment> GroupCipher for GroupCipherSuite<E> {
    type Key = GroupKey;

    fn ciphertext_size(&self) -> usize {
        self.layout.total_len()
    }

    fn plaintext_size(&self) -> usize {
        self.layout.text_len()
    }

    fn generate_key(&self) -> GroupKey {
        GroupKey::generate(&self.env)
    }

    fn encrypt(&self, plaintext: &[u8], keys: &[GroupKey]) -> Result<Vec<Vec<u8>>, CipherError> {
        self.encryption.encrypt(plaintext, keys)
    }

    fn try_decrypt(
        &self,
        ciphertext: &[u8],
        keys: &[GroupKey],
    ) -> Result<Option<Vec<u8>>, CipherError> {
        self.decryption.try_decrypt(ciphertext, keys)
    }

    fn encode_key(&self, key: &GroupKey) -> Vec<u8> {
        key.encode().to_vec()
    }

    fn decode_key(&self, bytes: &[u8]) -> Result<GroupKey, CipherError> {
        GroupKey::decode(bytes)
    }

    fn encoded_key_size(&self) -> usize {
        ENCODED_KEY_SIZE
    }
}
