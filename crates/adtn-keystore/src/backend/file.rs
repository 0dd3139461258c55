//! Password-protected key store file.
//!
//! # File Format
//!
//! ```text
//! ┌──────────────┬─────────────┬───────────┬────────────┬───────────────────────────┐
//! │ "ADTNKS" (6) │ version (1) │ salt (16) │ nonce (24) │ XChaCha20-Poly1305(CBOR)  │
//! └──────────────┴─────────────┴───────────┴────────────┴───────────────────────────┘
//! ```
//!
//! The file key is Argon2id(password, salt). The 47-byte header is bound to
//! the ciphertext as associated data. A fresh salt and nonce are drawn on
//! every write.
//!
//! # Security
//!
//! - A failed tag check is reported as `WrongPassword`. A tampered file and a
//!   wrong password both fail the tag check and cannot be told apart
//! - Password, derived key and plaintext buffers are zeroized after use
//! - Writes go to a sibling temporary file that is renamed over the target,
//!   so a crash never leaves a half-written store

use std::{
    fmt,
    fs::{self, File},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use adtn_crypto::{Environment, SystemEnv};
use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use super::{KeyStoreBackend, PersistedKeys};
use crate::error::KeyStoreError;

/// File signature
pub const FILE_MAGIC: [u8; 6] = *b"ADTNKS";

/// Current file format version
pub const FILE_VERSION: u8 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;
const FILE_KEY_LEN: usize = 32;
const HEADER_LEN: usize = FILE_MAGIC.len() + 1 + SALT_LEN + NONCE_LEN;

/// Key store password. Zeroized on drop, never printed.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wrap a password.
    ///
    /// # Errors
    ///
    /// - `EmptyPassword` if `password` is empty
    pub fn new(password: impl Into<String>) -> Result<Self, KeyStoreError> {
        let password = Zeroizing::new(password.into());
        if password.is_empty() {
            return Err(KeyStoreError::EmptyPassword);
        }
        Ok(Self(password))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Argon2id cost parameters for the file key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordKdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordKdfParams {
    fn default() -> Self {
        Self { memory_kib: 19 * 1024, iterations: 2, parallelism: 1 }
    }
}

impl PasswordKdfParams {
    fn derive_key(
        &self,
        password: &Password,
        salt: &[u8],
    ) -> Result<Zeroizing<[u8; FILE_KEY_LEN]>, KeyStoreError> {
        let params =
            Params::new(self.memory_kib, self.iterations, self.parallelism, Some(FILE_KEY_LEN))
                .map_err(|e| KeyStoreError::InvalidKdfParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; FILE_KEY_LEN]);
        argon2
            .hash_password_into(password.as_bytes(), salt, &mut key[..])
            .map_err(|e| KeyStoreError::InvalidKdfParams(e.to_string()))?;
        Ok(key)
    }
}

/// Encrypt `keys` into the file format.
///
/// Salt and nonce are drawn from `env`.
pub fn seal_keys(
    keys: &PersistedKeys,
    password: &Password,
    params: &PasswordKdfParams,
    env: &impl Environment,
) -> Result<Vec<u8>, KeyStoreError> {
    let mut header = [0u8; HEADER_LEN];
    header[..FILE_MAGIC.len()].copy_from_slice(&FILE_MAGIC);
    header[FILE_MAGIC.len()] = FILE_VERSION;
    let salt_start = FILE_MAGIC.len() + 1;
    let nonce_start = salt_start + SALT_LEN;
    env.random_bytes(&mut header[salt_start..nonce_start]);
    env.random_bytes(&mut header[nonce_start..]);

    let mut plaintext = Zeroizing::new(Vec::new());
    ciborium::into_writer(keys, &mut *plaintext)
        .map_err(|e| KeyStoreError::Serialization(e.to_string()))?;

    let file_key = params.derive_key(password, &header[salt_start..nonce_start])?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&file_key[..]));
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&header[nonce_start..]),
            Payload { msg: plaintext.as_slice(), aad: &header },
        )
        .map_err(|_| KeyStoreError::Serialization("encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a file produced by [`seal_keys`].
///
/// # Errors
///
/// - `Corrupted` if the file is truncated, has a foreign signature or version,
///   or decrypts to something that is not a key list
/// - `WrongPassword` if authentication fails
pub fn open_keys(
    bytes: &[u8],
    password: &Password,
    params: &PasswordKdfParams,
) -> Result<PersistedKeys, KeyStoreError> {
    if bytes.len() < HEADER_LEN + TAG_LEN {
        return Err(KeyStoreError::Corrupted(format!("file truncated at {} bytes", bytes.len())));
    }
    let (header, ciphertext) = bytes.split_at(HEADER_LEN);

    if header[..FILE_MAGIC.len()] != FILE_MAGIC {
        return Err(KeyStoreError::Corrupted("not a key store file".to_string()));
    }
    let version = header[FILE_MAGIC.len()];
    if version != FILE_VERSION {
        return Err(KeyStoreError::Corrupted(format!("unsupported version {version}")));
    }

    let salt_start = FILE_MAGIC.len() + 1;
    let nonce_start = salt_start + SALT_LEN;
    let file_key = params.derive_key(password, &header[salt_start..nonce_start])?;
    let cipher = XChaCha20Poly1305::new(Key::from_slice(&file_key[..]));

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(XNonce::from_slice(&header[nonce_start..]), Payload {
                msg: ciphertext,
                aad: header,
            })
            .map_err(|_| KeyStoreError::WrongPassword)?,
    );

    ciborium::from_reader(plaintext.as_slice())
        .map_err(|e| KeyStoreError::Corrupted(format!("invalid key list: {e}")))
}

/// Key store persisted to a password-protected file.
pub struct EncryptedFileBackend<E: Environment = SystemEnv> {
    path: PathBuf,
    password: Password,
    params: PasswordKdfParams,
    env: E,
}

impl EncryptedFileBackend<SystemEnv> {
    /// Backend for the file at `path`, which need not exist yet.
    pub fn new(path: impl Into<PathBuf>, password: Password, params: PasswordKdfParams) -> Self {
        Self::with_env(path, password, params, SystemEnv::new())
    }
}

impl<E: Environment> EncryptedFileBackend<E> {
    /// Backend with an explicit environment for salts and nonces.
    pub fn with_env(
        path: impl Into<PathBuf>,
        password: Password,
        params: PasswordKdfParams,
        env: E,
    ) -> Self {
        Self { path: path.into(), password, params, env }
    }

    /// Location of the key store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }
}

impl<E: Environment> KeyStoreBackend for EncryptedFileBackend<E> {
    fn load(&self) -> Result<Option<PersistedKeys>, KeyStoreError> {
        let mut bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let result = open_keys(&bytes, &self.password, &self.params);
        bytes.zeroize();
        result.map(Some)
    }

    fn store(&self, keys: &PersistedKeys) -> Result<(), KeyStoreError> {
        let sealed = seal_keys(keys, &self.password, &self.params, &self.env)?;
        let temp = self.temp_path();

        let written =
            Self::write_synced(&temp, &sealed).and_then(|()| fs::rename(&temp, &self.path));
        if let Err(error) = written {
            match fs::remove_file(&temp) {
                Ok(()) => {},
                Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {},
                Err(cleanup) => {
                    debug!(path = %temp.display(), %cleanup, "temporary file not removed");
                },
            }
            return Err(error.into());
        }

        debug!(path = %self.path.display(), entries = keys.entries.len(), "key store written");
        Ok(())
    }
}

impl<E: Environment> fmt::Debug for EncryptedFileBackend<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedFileBackend")
            .field("path", &self.path)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
