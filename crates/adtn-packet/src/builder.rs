//! Translation between application messages and fixed-size packets.
//!
//! # Block Layout
//!
//! ```text
//! offset 0           : payload length, u16 little-endian (1..=max_message_size)
//! offset 2           : payload
//! offset 2 + length  : zero padding up to 2 + max_message_size
//! ```
//!
//! Every block has the same length, so every encrypted packet has the same
//! length, and random cover packets match it exactly.

use adtn_crypto::{Environment, GroupCipher, GroupCipherSuite, SystemEnv};
use tracing::{debug, warn};

use crate::{
    config::{HEADER_LEN, MAX_MAX_MESSAGE_SIZE, PacketConfig},
    error::PacketError,
};

/// Builds and opens packets for one cipher.
///
/// # Invariants
///
/// - `cipher.plaintext_size() == HEADER_LEN + max_message_size`
/// - Every packet from [`create_packets`](Self::create_packets) and
///   [`create_random_packet`](Self::create_random_packet) is
///   [`encrypted_packet_size`](Self::encrypted_packet_size) bytes
#[derive(Debug, Clone)]
pub struct PacketBuilder<C: GroupCipher, E: Environment = SystemEnv> {
    cipher: C,
    env: E,
    max_message_size: usize,
}

impl PacketBuilder<GroupCipherSuite, SystemEnv> {
    /// Builder over the group cipher suite sized for `config`.
    pub fn from_config(config: &PacketConfig) -> Result<Self, PacketError> {
        config.validate()?;
        let suite = GroupCipherSuite::new(config.unencrypted_packet_size())?;
        Self::new(config.max_message_size, suite)
    }
}

impl<C: GroupCipher> PacketBuilder<C, SystemEnv> {
    /// Bind `cipher` to packets carrying at most `max_message_size` bytes.
    pub fn new(max_message_size: usize, cipher: C) -> Result<Self, PacketError> {
        Self::with_env(max_message_size, cipher, SystemEnv::new())
    }
}

impl<C: GroupCipher, E: Environment> PacketBuilder<C, E> {
    /// Bind `cipher` with an explicit environment for cover traffic.
    ///
    /// # Errors
    ///
    /// - `InvalidMaxMessageSize` if `max_message_size` is zero or too large for
    ///   the 2-byte header
    /// - `SizeMismatch` if the cipher's block size is not
    ///   `2 + max_message_size`
    pub fn with_env(max_message_size: usize, cipher: C, env: E) -> Result<Self, PacketError> {
        if !(1..=MAX_MAX_MESSAGE_SIZE).contains(&max_message_size) {
            return Err(PacketError::InvalidMaxMessageSize(max_message_size));
        }

        let expected = HEADER_LEN + max_message_size;
        if cipher.plaintext_size() != expected {
            return Err(PacketError::SizeMismatch { expected, actual: cipher.plaintext_size() });
        }

        Ok(Self { cipher, env, max_message_size })
    }

    /// Largest payload carried by one packet.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Length of the block handed to the cipher.
    pub fn unencrypted_packet_size(&self) -> usize {
        HEADER_LEN + self.max_message_size
    }

    /// Length of every packet on the wire.
    pub fn encrypted_packet_size(&self) -> usize {
        self.cipher.ciphertext_size()
    }

    /// Cipher used by this builder.
    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Wrap `message` into one encrypted packet per key.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge` if `message` exceeds
    ///   [`max_message_size`](Self::max_message_size); nothing is encrypted
    pub fn create_packets(
        &self,
        message: &[u8],
        keys: &[C::Key],
    ) -> Result<Vec<Vec<u8>>, PacketError> {
        if message.len() > self.max_message_size {
            return Err(PacketError::MessageTooLarge {
                size: message.len(),
                max: self.max_message_size,
            });
        }

        let mut block = vec![0u8; self.unencrypted_packet_size()];
        // INVARIANT: max_message_size <= u16::MAX - 2, so the length fits
        let length = message.len() as u16;
        block[..HEADER_LEN].copy_from_slice(&length.to_le_bytes());
        block[HEADER_LEN..HEADER_LEN + message.len()].copy_from_slice(message);

        Ok(self.cipher.encrypt(&block, keys)?)
    }

    /// Open `packet` with the first matching key.
    ///
    /// Returns the payload, or an empty vector when the packet is not for any
    /// of `keys`, has the wrong length, or carries an out-of-range length
    /// header. All three are indistinguishable to the caller.
    pub fn try_unpack_packet(&self, packet: &[u8], keys: &[C::Key]) -> Vec<u8> {
        if packet.len() != self.encrypted_packet_size() {
            debug!(
                expected = self.encrypted_packet_size(),
                actual = packet.len(),
                "dropping mis-sized packet"
            );
            return Vec::new();
        }

        let block = match self.cipher.try_decrypt(packet, keys) {
            Ok(Some(block)) => block,
            Ok(None) => return Vec::new(),
            Err(error) => {
                debug!(%error, "dropping undecryptable packet");
                return Vec::new();
            },
        };

        let Some(header) = block.first_chunk::<HEADER_LEN>() else {
            warn!(len = block.len(), "decrypted block shorter than header");
            return Vec::new();
        };
        let length = u16::from_le_bytes(*header) as usize;

        if length == 0 || length > self.max_message_size {
            warn!(length, max = self.max_message_size, "decrypted header out of range");
            return Vec::new();
        }

        block.get(HEADER_LEN..HEADER_LEN + length).map(<[u8]>::to_vec).unwrap_or_default()
    }

    /// Random packet of the encrypted size, for cover traffic.
    pub fn create_random_packet(&self) -> Vec<u8> {
        let mut packet = vec![0u8; self.encrypted_packet_size()];
        self.env.random_bytes(&mut packet);
        packet
    }
}
