//! Packet-oriented transport collaborator.
//!
//! The transport moves whole frames. Every buffer handed to
//! [`PacketSocket::send`] is exactly one encrypted packet, and every buffer
//! returned by [`PacketSocket::receive`] is treated as one candidate packet.

use thiserror::Error;

/// Transport failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    /// Socket was closed locally or by the peer
    #[error("socket closed")]
    Closed,

    /// Underlying I/O failed
    #[error("socket I/O failed: {reason}")]
    Io {
        /// Reason for the failure
        reason: String,
    },
}

impl SocketError {
    /// Returns true if the socket cannot be used again.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io { .. } => false,
        }
    }
}

/// Packet transport.
///
/// Implementations are blocking; a caller that wants concurrency runs the
/// socket on its own thread.
pub trait PacketSocket {
    /// Send one packet.
    fn send(&mut self, packet: &[u8]) -> Result<(), SocketError>;

    /// Receive the next packet.
    fn receive(&mut self) -> Result<Vec<u8>, SocketError>;

    /// Close the socket. Later calls fail with [`SocketError::Closed`].
    fn close(&mut self);
}
