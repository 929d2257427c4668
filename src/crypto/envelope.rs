//! On-disk vault envelope and the ordered list of decryption schemes.
//!
//! ```text
//! iterations (u32 BE) | salt (32) | nonce (12) | ciphertext + tag
//! ```
//!
//! New files are always sealed with a current scheme.  Opening tries
//! each entry of `DECRYPT_SCHEMES` in order and takes the first one that
//! authenticates, so older files keep opening and are silently upgraded
//! on the next save.

use zeroize::Zeroizing;

use super::encryption::{self, Cipher, NonceCounter, NONCE_LEN, TAG_LEN};
use super::kdf::{derive_key, MAX_ITERATIONS, SALT_LEN};
use super::keys::{Credentials, MasterKey};
use crate::errors::{Result, StrongboxError};

/// Associated data bound to every current-format ciphertext.
pub const VAULT_AAD: &[u8] = b"strongbox/vault/v2";

const ITERATIONS_LEN: usize = 4;

/// Bytes before the ciphertext.
pub const HEADER_LEN: usize = ITERATIONS_LEN + SALT_LEN + NONCE_LEN;

/// Smallest well-formed file: a header plus an empty, tagged ciphertext.
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_LEN;

/// How the KDF input is built from the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivation {
    /// `passphrase || HMAC-SHA512(keyfile, passphrase)`
    Current,
    /// `passphrase || SHA-512(keyfile)`
    Legacy,
}

impl KeyDerivation {
    pub fn derive(self, credentials: &Credentials, salt: &[u8], iterations: u32) -> Result<MasterKey> {
        match self {
            KeyDerivation::Current => derive_key(&credentials.current_auth()?, salt, iterations),
            KeyDerivation::Legacy => derive_key(&credentials.legacy_auth(), salt, iterations),
        }
    }

    /// The derivation whose key this one shares for `credentials`.
    /// Without a keyfile both forms reduce to the bare passphrase.
    pub fn key_source(self, credentials: &Credentials) -> Self {
        if credentials.has_keyfile() {
            self
        } else {
            KeyDerivation::Current
        }
    }
}

/// One way a vault may have been sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheme {
    pub name: &'static str,
    pub derivation: KeyDerivation,
    pub cipher: Cipher,
    pub aad: Option<&'static [u8]>,
}

impl Scheme {
    /// Legacy schemes are accepted for reading only.
    pub fn is_legacy(&self) -> bool {
        self.derivation == KeyDerivation::Legacy || self.aad.is_none()
    }
}

pub const AES_GCM_V2: Scheme = Scheme {
    name: "aes-256-gcm/v2",
    derivation: KeyDerivation::Current,
    cipher: Cipher::Aes256Gcm,
    aad: Some(VAULT_AAD),
};

pub const CHACHA20_POLY1305_V2: Scheme = Scheme {
    name: "chacha20-poly1305/v2",
    derivation: KeyDerivation::Current,
    cipher: Cipher::ChaCha20Poly1305,
    aad: Some(VAULT_AAD),
};

pub const LEGACY_AES_GCM: Scheme = Scheme {
    name: "aes-256-gcm/legacy",
    derivation: KeyDerivation::Legacy,
    cipher: Cipher::Aes256Gcm,
    aad: None,
};

/// Tried in order when opening a vault.
pub const DECRYPT_SCHEMES: &[Scheme] = &[AES_GCM_V2, CHACHA20_POLY1305_V2, LEGACY_AES_GCM];

/// Scheme used to seal new data with `cipher`.
pub fn current_scheme(cipher: Cipher) -> &'static Scheme {
    match cipher {
        Cipher::Aes256Gcm => &AES_GCM_V2,
        Cipher::ChaCha20Poly1305 => &CHACHA20_POLY1305_V2,
    }
}

/// Borrowed view of a vault file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub iterations: u32,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Split a vault file into its parts.  Does not authenticate.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < MIN_ENVELOPE_LEN {
            return Err(StrongboxError::InvalidVaultFile(format!(
                "file is {} bytes, expected at least {MIN_ENVELOPE_LEN}",
                data.len()
            )));
        }
        let (iterations, rest) = data.split_at(ITERATIONS_LEN);
        let (salt, rest) = rest.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let mut iter_bytes = [0u8; ITERATIONS_LEN];
        iter_bytes.copy_from_slice(iterations);
        let iterations = u32::from_be_bytes(iter_bytes);
        if iterations == 0 {
            return Err(StrongboxError::InvalidVaultFile(
                "iteration count is zero".into(),
            ));
        }
        if iterations > MAX_ITERATIONS {
            return Err(StrongboxError::InvalidVaultFile(format!(
                "iteration count {iterations} exceeds {MAX_ITERATIONS}"
            )));
        }

        let mut envelope = Envelope {
            iterations,
            salt: [0u8; SALT_LEN],
            nonce: [0u8; NONCE_LEN],
            ciphertext,
        };
        envelope.salt.copy_from_slice(salt);
        envelope.nonce.copy_from_slice(nonce);
        Ok(envelope)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.iterations.to_be_bytes());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(self.ciphertext);
        out
    }
}

/// Result of a successful open.
pub struct Opened {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub iterations: u32,
    pub salt: [u8; SALT_LEN],
    pub counter: NonceCounter,
    pub scheme: &'static Scheme,
}

/// Seal `plaintext` into a complete vault file with `scheme`.
pub fn seal_vault(
    scheme: &Scheme,
    credentials: &Credentials,
    iterations: u32,
    salt: &[u8; SALT_LEN],
    counter: &mut NonceCounter,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let key = scheme.derivation.derive(credentials, salt, iterations)?;
    let nonce = counter.next_nonce();
    let ciphertext = encryption::seal(scheme.cipher, &key, &nonce, plaintext, scheme.aad)?;

    Ok(Envelope {
        iterations,
        salt: *salt,
        nonce,
        ciphertext: &ciphertext,
    }
    .to_bytes())
}

/// Open a vault file, trying every scheme in `DECRYPT_SCHEMES`.
pub fn open_vault(credentials: &Credentials, data: &[u8]) -> Result<Opened> {
    open_vault_with(credentials, data, DECRYPT_SCHEMES)
}

/// Open a vault file, trying `schemes` in order.
///
/// Each distinct derived key is computed at most once.  A wrong passphrase,
/// wrong keyfile and a tampered file are indistinguishable and all
/// yield `AuthenticationFailed`.
pub fn open_vault_with(
    credentials: &Credentials,
    data: &[u8],
    schemes: &'static [Scheme],
) -> Result<Opened> {
    let envelope = Envelope::parse(data)?;
    let mut keys: Vec<(KeyDerivation, MasterKey)> = Vec::with_capacity(2);

    for scheme in schemes {
        let source = scheme.derivation.key_source(credentials);
        let index = match keys.iter().position(|(d, _)| *d == source) {
            Some(index) => index,
            None => {
                let key = source.derive(credentials, &envelope.salt, envelope.iterations)?;
                keys.push((source, key));
                keys.len() - 1
            }
        };

        if let Ok(plaintext) = encryption::open(
            scheme.cipher,
            &keys[index].1,
            &envelope.nonce,
            envelope.ciphertext,
            scheme.aad,
        ) {
            return Ok(Opened {
                plaintext: Zeroizing::new(plaintext),
                iterations: envelope.iterations,
                salt: envelope.salt,
                counter: NonceCounter::from_nonce(&envelope.nonce),
                scheme,
            });
        }
    }

    Err(StrongboxError::AuthenticationFailed)
}
