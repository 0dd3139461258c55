//! Fuzz target for the encrypted key store file decoder
//!
//! # Strategy
//!
//! - Raw bytes straight into `open_keys`
//! - Valid files with arbitrary corruption applied after sealing
//!
//! # Invariants
//!
//! - Decoding never panics on any input
//! - A sealed file opens to exactly what was sealed
//! - Any corrupted byte is reported as an error, never as different keys

#![no_main]

use adtn_crypto::SystemEnv;
use adtn_keystore::{
    KeyStoreError, Password, PasswordKdfParams, PersistedEntry, PersistedKeys, open_keys,
    seal_keys,
};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

// Cheapest Argon2 cost; the fuzzer exercises parsing, not hashing
const FAST: PasswordKdfParams = PasswordKdfParams { memory_kib: 8, iterations: 1, parallelism: 1 };

#[derive(Debug, Arbitrary)]
enum FileScenario {
    /// Arbitrary bytes as a key store file
    Raw(Vec<u8>),
    /// Seal a key list, then flip one byte
    Corrupt { entries: Vec<(u64, String, Vec<u8>)>, flip_at: u16, mask: u8 },
}

fuzz_target!(|scenario: FileScenario| {
    let password = Password::new("fuzz").unwrap();

    match scenario {
        FileScenario::Raw(bytes) => {
            // INVARIANT 1: never panics
            let _ = open_keys(&bytes, &password, &FAST);
        },

        FileScenario::Corrupt { entries, flip_at, mask } => {
            let keys = PersistedKeys {
                next_id: entries.len() as u64 + 1,
                entries: entries
                    .into_iter()
                    .take(8)
                    .map(|(id, alias, key)| PersistedEntry { id, alias, key })
                    .collect(),
            };
            let mut sealed = seal_keys(&keys, &password, &FAST, &SystemEnv::new()).unwrap();

            // INVARIANT 2: round-trip
            assert_eq!(open_keys(&sealed, &password, &FAST).unwrap(), keys);

            if mask == 0 {
                return;
            }
            let index = usize::from(flip_at) % sealed.len();
            sealed[index] ^= mask;

            // INVARIANT 3: corruption is always detected
            match open_keys(&sealed, &password, &FAST) {
                Err(KeyStoreError::WrongPassword | KeyStoreError::Corrupted(_)) => {},
                other => panic!("corruption at byte {index} not detected: {other:?}"),
            }
        },
    }
});
