//! Fuzz target for the packet unpack path
//!
//! Feeds attacker-controlled frames to `try_unpack_packet`, under both the
//! real cipher suite and the passthrough cipher (which exposes the length
//! header directly to the fuzzer).
//!
//! # Invariants
//!
//! - Unpacking never panics, whatever the frame length or content
//! - A payload is never longer than `max_message_size`
//! - A packet built from a message unpacks to exactly that message
//! - Flipping any byte of a real packet makes it unpack to nothing

#![no_main]

use adtn_crypto::{GroupCipherSuite, GroupKey, PassthroughCipher, PassthroughKey};
use adtn_packet::PacketBuilder;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

const MAX: usize = 96;

#[derive(Debug, Arbitrary)]
struct UnpackScenario {
    /// Raw frame received from the network
    frame: Vec<u8>,
    /// Message to round-trip
    message: Vec<u8>,
    /// Group key material
    cipher_key: [u8; 32],
    mac_key: [u8; 32],
    /// Byte to corrupt in the round-tripped packet
    flip_at: u16,
}

fuzz_target!(|scenario: UnpackScenario| {
    // Keys with a degenerate MAC half are refused at construction
    let Ok(key) = GroupKey::from_parts(scenario.cipher_key, scenario.mac_key) else {
        return;
    };
    let suite = PacketBuilder::new(MAX, GroupCipherSuite::new(MAX + 2).unwrap()).unwrap();

    // INVARIANT 1: arbitrary frames never panic and never yield oversized payloads
    let payload = suite.try_unpack_packet(&scenario.frame, std::slice::from_ref(&key));
    assert!(payload.len() <= MAX);

    // INVARIANT 2: passthrough frames reach the header check unencrypted
    let debug = PacketBuilder::new(MAX, PassthroughCipher::new(MAX + 2).unwrap()).unwrap();
    let payload = debug.try_unpack_packet(&scenario.frame, &[PassthroughKey(0)]);
    assert!(payload.len() <= MAX);

    // INVARIANT 3: round-trip of any message that fits
    let mut message = scenario.message;
    message.truncate(MAX);
    if message.is_empty() {
        return;
    }
    let packets = suite.create_packets(&message, std::slice::from_ref(&key)).unwrap();
    assert_eq!(packets.len(), 1);
    assert_eq!(suite.try_unpack_packet(&packets[0], std::slice::from_ref(&key)), message);

    // INVARIANT 4: any single corrupted byte is rejected
    let mut corrupted = packets[0].clone();
    let index = usize::from(scenario.flip_at) % corrupted.len();
    corrupted[index] ^= 0x01;
    assert!(suite.try_unpack_packet(&corrupted, &[key]).is_empty());
});
