//! In-memory key material.
//!
//! `MasterKey` holds a derived 32-byte key and `Credentials` holds what
//! the user typed (plus optional keyfile bytes).  Both are wiped when
//! dropped and neither implements `Display` or a revealing `Debug`.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use super::kdf::KEY_LEN;
use super::keyfile::{combine_passphrase_keyfile, combine_passphrase_keyfile_legacy};
use crate::errors::Result;

/// A wrapper around a 32-byte derived key that automatically zeroes
/// its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// Passphrase and optional keyfile contents for one vault.
#[derive(Clone)]
pub struct Credentials {
    passphrase: Zeroizing<Vec<u8>>,
    keyfile: Option<Zeroizing<Vec<u8>>>,
}

impl Credentials {
    pub fn new(passphrase: &[u8], keyfile: Option<&[u8]>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.to_vec()),
            keyfile: keyfile.map(|k| Zeroizing::new(k.to_vec())),
        }
    }

    pub fn has_keyfile(&self) -> bool {
        self.keyfile.is_some()
    }

    /// KDF input for current vaults: the passphrase, followed by
    /// `HMAC-SHA512(keyfile, passphrase)` when a keyfile is present.
    pub fn current_auth(&self) -> Result<Zeroizing<Vec<u8>>> {
        match &self.keyfile {
            Some(keyfile) => combine_passphrase_keyfile(&self.passphrase, keyfile),
            None => Ok(self.passphrase.clone()),
        }
    }

    /// KDF input for legacy vaults: the passphrase, followed by
    /// `SHA-512(keyfile)` when a keyfile is present.
    pub fn legacy_auth(&self) -> Zeroizing<Vec<u8>> {
        match &self.keyfile {
            Some(keyfile) => combine_passphrase_keyfile_legacy(&self.passphrase, keyfile),
            None => self.passphrase.clone(),
        }
    }

    /// Constant-time comparison of two credential sets.
    pub fn matches(&self, other: &Credentials) -> Result<bool> {
        let ours = self.current_auth()?;
        let theirs = other.current_auth()?;
        let same_shape = self.has_keyfile() == other.has_keyfile();
        Ok(same_shape && bool::from(ours.as_slice().ct_eq(theirs.as_slice())))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("passphrase", &"<redacted>")
            .field("keyfile", &self.keyfile.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
