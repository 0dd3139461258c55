//! Public-message encryption for broadcast groups.
//!
//! A public message is one fixed-size plaintext block sent to every group the
//! sender belongs to. The encryptor emits one frame per group key; the
//! decryptor tries each candidate key until a MAC matches.
//!
//! # Frame construction (encrypt-then-MAC)
//!
//! ```text
//! nonce       = random(16)
//! ciphertext  = ChaCha20(cipher_key, nonce[..8]) XOR block
//! mac         = Poly1305-AES(mac_key, nonce, ciphertext)
//! frame       = mac || nonce || ciphertext
//! ```
//!
//! The receiver verifies the MAC over the ciphertext before decrypting, so a
//! frame for a foreign group costs one MAC computation per key and is never
//! decrypted.
//!
//! # Security
//!
//! - Each frame gets its own nonce, even when one block is encrypted under
//!   several keys, so frames of one message cannot be linked to each other
//! - MAC comparison is constant time

mod decryption;
mod encryption;

pub use decryption::PublicMessageDecryption;
pub use encryption::PublicMessageEncryption;
