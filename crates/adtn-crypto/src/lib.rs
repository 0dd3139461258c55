//! aDTN Group Cipher Suite
//!
//! Fixed-size broadcast encryption for delay-tolerant ad-hoc networks. A node
//! encrypts every outgoing block once per group key it holds; receivers try
//! each of their group keys until one authenticates the frame.
//!
//! # Frame Format
//!
//! ```text
//! ┌──────────┬────────────┬──────────────────────────────┐
//! │ MAC (16) │ Nonce (16) │ Ciphertext (plaintext_size)  │
//! └──────────┴────────────┴──────────────────────────────┘
//!              │
//!              └─ first 8 bytes are the ChaCha20 nonce
//! ```
//!
//! Frame length depends only on the configured plaintext size. With the
//! default packet configuration (1455-byte blocks) every frame is 1487 bytes.
//!
//! # Security
//!
//! Confidentiality:
//! - ChaCha20 (original 64-bit nonce variant) under the group cipher key
//!
//! Authenticity:
//! - Poly1305-AES over the ciphertext, nonce encrypted under the MAC key's
//!   AES half
//! - Constant-time tag comparison
//!
//! Unlinkability:
//! - Independent random nonce per frame, so the frames of one block under
//!   different keys share no bytes an observer could correlate
//! - No key identifier on the wire; receivers find the key by trial
//!
//! # Trial Decryption
//!
//! "No key matched" is returned as `Ok(None)`. It is the common case for
//! overheard traffic and never surfaces as an error.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod frame;
pub mod group_key;
pub mod nonce;
pub mod passthrough;
pub mod primitives;
pub mod public_message;
pub mod suite;

pub use env::{Environment, SystemEnv};
pub use error::CipherError;
pub use frame::FrameLayout;
pub use group_key::{CIPHER_KEY_SIZE, ENCODED_KEY_SIZE, GroupKey, MAC_KEY_SIZE};
pub use nonce::NonceGenerator;
pub use passthrough::{PassthroughCipher, PassthroughKey};
pub use public_message::{PublicMessageDecryption, PublicMessageEncryption};
pub use suite::{
    CIPHER_NONCE_LEN, FRAME_OVERHEAD, GroupCipher, GroupCipherSuite, MAC_LEN, NONCE_LEN,
};
