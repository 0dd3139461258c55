//! aDTN Packet Layer
//!
//! Turns variable-length application messages into fixed-size encrypted
//! packets and back, and produces random cover packets of the same size.
//!
//! # Packet Pipeline
//!
//! ```text
//! message (≤ max_message_size)
//!        │
//!        ▼
//! block = len_le16 || message || zero padding     (2 + max_message_size)
//!        │
//!        ▼
//! GroupCipher::encrypt → one frame per group key  (encrypted_packet_size)
//!        │
//!        ▼
//! PacketSocket::send
//! ```
//!
//! Receiving runs the pipeline backwards. Packets that no key opens, and
//! packets whose decrypted header is out of range, come back as an empty
//! payload: a hostile packet and a packet for another group look the same.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod channel;
pub mod config;
pub mod error;
pub mod preferences;
pub mod socket;

pub use builder::PacketBuilder;
pub use channel::MessageChannel;
pub use config::{DEFAULT_MAX_MESSAGE_SIZE, HEADER_LEN, MAX_MAX_MESSAGE_SIZE, PacketConfig};
pub use error::PacketError;
pub use preferences::{Preferences, PreferencesEditor, SharedPreferences};
pub use socket::{PacketSocket, SocketError};
