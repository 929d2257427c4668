//! Authenticated encryption (AES-256-GCM or ChaCha20-Poly1305).
//!
//! Nonces are never random on their own: the first 8 bytes are a
//! big-endian counter that is bumped before every encryption and
//! carried over from the last nonce found in the file, the last 4 are
//! fresh random bytes.  With a salt that stays fixed for the life of a
//! key, this makes nonce reuse under one key impossible.
//!
//! Layout produced by `encrypt`:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use std::fmt;
use std::str::FromStr;

use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::keys::MasterKey;
use crate::errors::{Result, StrongboxError};

/// Size of the AEAD nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Bytes of the nonce taken by the counter.
const COUNTER_LEN: usize = 8;

/// AEAD algorithm used to seal a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cipher {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl Cipher {
    pub fn as_str(self) -> &'static str {
        match self {
            Cipher::Aes256Gcm => "aes-256-gcm",
            Cipher::ChaCha20Poly1305 => "chacha20-poly1305",
        }
    }
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cipher {
    type Err = StrongboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "aes-256-gcm" | "aes" => Ok(Cipher::Aes256Gcm),
            "chacha20-poly1305" | "chacha" => Ok(Cipher::ChaCha20Poly1305),
            other => Err(StrongboxError::ConfigError(format!(
                "unknown cipher '{other}' (expected aes-256-gcm or chacha20-poly1305)"
            ))),
        }
    }
}

/// Monotonic nonce source for one vault key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NonceCounter(u64);

impl NonceCounter {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Resume from a nonce found in an existing vault file.
    pub fn from_nonce(nonce: &[u8; NONCE_LEN]) -> Self {
        let mut counter = [0u8; COUNTER_LEN];
        counter.copy_from_slice(&nonce[..COUNTER_LEN]);
        Self(u64::from_be_bytes(counter))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Advance the counter and build the next nonce.
    pub fn next_nonce(&mut self) -> [u8; NONCE_LEN] {
        self.0 = self.0.wrapping_add(1);
        let mut nonce = [0u8; NONCE_LEN];
        nonce[..COUNTER_LEN].copy_from_slice(&self.0.to_be_bytes());
        rand::rng().fill_bytes(&mut nonce[COUNTER_LEN..]);
        nonce
    }
}

/// Encrypt `plaintext` under `nonce`, binding `aad` when given.
///
/// Returns ciphertext with the auth tag appended.
pub fn seal(
    cipher: Cipher,
    key: &MasterKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
    aad: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let payload = Payload {
        msg: plaintext,
        aad: aad.unwrap_or_default(),
    };
    match cipher {
        Cipher::Aes256Gcm => seal_with::<Aes256Gcm>(key, nonce, payload),
        Cipher::ChaCha20Poly1305 => seal_with::<ChaCha20Poly1305>(key, nonce, payload),
    }
}

/// Decrypt and verify `ciphertext` (with trailing tag).
///
/// Any failure, including a wrong key, is reported as
/// `AuthenticationFailed`.
pub fn open(
    cipher: Cipher,
    key: &MasterKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    aad: Option<&[u8]>,
) -> Result<Vec<u8>> {
    if ciphertext.len() < TAG_LEN {
        return Err(StrongboxError::AuthenticationFailed);
    }
    let payload = Payload {
        msg: ciphertext,
        aad: aad.unwrap_or_default(),
    };
    match cipher {
        Cipher::Aes256Gcm => open_with::<Aes256Gcm>(key, nonce, payload),
        Cipher::ChaCha20Poly1305 => open_with::<ChaCha20Poly1305>(key, nonce, payload),
    }
}

/// Encrypt with the next counter nonce and prepend it to the output.
pub fn encrypt(
    cipher: Cipher,
    key: &MasterKey,
    counter: &mut NonceCounter,
    plaintext: &[u8],
    aad: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let nonce = counter.next_nonce();
    let ciphertext = seal(cipher, key, &nonce, plaintext, aad)?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
pub fn decrypt(
    cipher: Cipher,
    key: &MasterKey,
    data: &[u8],
    aad: Option<&[u8]>,
) -> Result<Vec<u8>> {
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(StrongboxError::AuthenticationFailed);
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(nonce_bytes);
    open(cipher, key, &nonce, ciphertext, aad)
}

fn seal_with<C: Aead + KeyInit>(
    key: &MasterKey,
    nonce: &[u8; NONCE_LEN],
    payload: Payload<'_, '_>,
) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key.as_bytes())
        .map_err(|e| StrongboxError::EncryptionFailed(format!("invalid key length: {e}")))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(nonce), payload)
        .map_err(|e| StrongboxError::EncryptionFailed(format!("encryption error: {e}")))
}

fn open_with<C: Aead + KeyInit>(
    key: &MasterKey,
    nonce: &[u8; NONCE_LEN],
    payload: Payload<'_, '_>,
) -> Result<Vec<u8>> {
    let cipher =
        C::new_from_slice(key.as_bytes()).map_err(|_| StrongboxError::AuthenticationFailed)?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), payload)
        .map_err(|_| StrongboxError::AuthenticationFailed)
}
