//! Glue between a packet socket and a packet builder.

use adtn_crypto::{Environment, GroupCipher, SystemEnv};
use tracing::{debug, trace};

use crate::{builder::PacketBuilder, error::PacketError, socket::PacketSocket};

/// Sends messages as encrypted packets and receives them back.
///
/// The channel owns its socket. Keys are passed per call so the caller can
/// take a fresh snapshot of its key store each time.
#[derive(Debug)]
pub struct MessageChannel<S: PacketSocket, C: GroupCipher, E: Environment = SystemEnv> {
    socket: S,
    builder: PacketBuilder<C, E>,
}

impl<S: PacketSocket, C: GroupCipher, E: Environment> MessageChannel<S, C, E> {
    /// Wire `socket` to `builder`.
    pub fn new(socket: S, builder: PacketBuilder<C, E>) -> Self {
        Self { socket, builder }
    }

    /// Packet builder used by this channel.
    pub fn builder(&self) -> &PacketBuilder<C, E> {
        &self.builder
    }

    /// Send `message` once per key. Returns the number of packets sent.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge` before anything is sent
    /// - `Socket` if a send fails; packets for earlier keys were already sent
    pub fn send_message(&mut self, message: &[u8], keys: &[C::Key]) -> Result<usize, PacketError> {
        let packets = self.builder.create_packets(message, keys)?;
        for packet in &packets {
            self.socket.send(packet)?;
        }
        trace!(count = packets.len(), "sent message packets");
        Ok(packets.len())
    }

    /// Send one random cover packet.
    pub fn send_cover_packet(&mut self) -> Result<(), PacketError> {
        let packet = self.builder.create_random_packet();
        self.socket.send(&packet)?;
        Ok(())
    }

    /// Receive one packet and try to open it.
    ///
    /// Returns `Ok(None)` for cover traffic, packets of other groups and
    /// malformed packets.
    ///
    /// # Errors
    ///
    /// - `Socket` if the receive fails
    pub fn receive_message(&mut self, keys: &[C::Key]) -> Result<Option<Vec<u8>>, PacketError> {
        let packet = self.socket.receive()?;
        let message = self.builder.try_unpack_packet(&packet, keys);

        if message.is_empty() {
            debug!(len = packet.len(), "ignoring packet without readable message");
            Ok(None)
        } else {
            Ok(Some(message))
        }
    }

    /// Close the underlying socket.
    pub fn close(&mut self) {
        self.socket.close();
    }

    /// Take the socket back.
    pub fn into_socket(self) -> S {
        self.socket
    }
}
