//! Packet size configuration.

use adtn_crypto::FRAME_OVERHEAD;
use serde::{Deserialize, Serialize};

use crate::error::PacketError;

/// Length of the little-endian payload length header
pub const HEADER_LEN: usize = 2;

/// Default maximum payload per packet.
///
/// Chosen so an encrypted frame plus one protocol byte fills a 1488-byte
/// link-layer payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1453;

/// Largest maximum message size whose block length still fits the header
/// arithmetic.
pub const MAX_MAX_MESSAGE_SIZE: usize = u16::MAX as usize - HEADER_LEN;

/// Packet configuration shared by every node of a deployment.
///
/// All nodes must agree on `max_message_size`: it fixes the frame length on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketConfig {
    /// Largest application payload carried by one packet
    pub max_message_size: usize,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self { max_message_size: DEFAULT_MAX_MESSAGE_SIZE }
    }
}

impl PacketConfig {
    /// Check that the configured size is usable.
    pub fn validate(&self) -> Result<(), PacketError> {
        if (1..=MAX_MAX_MESSAGE_SIZE).contains(&self.max_message_size) {
            Ok(())
        } else {
            Err(PacketError::InvalidMaxMessageSize(self.max_message_size))
        }
    }

    /// Size of the block handed to the cipher: header plus padded payload.
    pub fn unencrypted_packet_size(&self) -> usize {
        HEADER_LEN + self.max_message_size
    }

    /// Size of a frame produced by the group cipher suite.
    pub fn encrypted_packet_size(&self) -> usize {
        self.unencrypted_packet_size() + FRAME_OVERHEAD
    }
}
