//! Keyfile-based second factor.
//!
//! A keyfile is any non-empty file; `generate_keyfile` writes 64 random
//! bytes.  When a vault uses one, its bytes are mixed into the
//! passphrase before key derivation:
//!
//! - current vaults: `passphrase || HMAC-SHA512(keyfile, passphrase)`
//! - legacy vaults:  `passphrase || SHA-512(keyfile)`

use std::fs;
use std::path::Path;

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

use crate::errors::{Result, StrongboxError};

/// Length of generated keyfiles in bytes (512 bits).
pub const KEYFILE_LEN: usize = 64;

/// Generate a new random keyfile and write it to `path`.
///
/// The file is written with owner-only permissions on Unix.  Returns the
/// raw bytes so the caller can use them immediately.
pub fn generate_keyfile(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if path.exists() {
        return Err(StrongboxError::KeyfileError(format!(
            "keyfile already exists at {}",
            path.display()
        )));
    }

    let mut keyfile = Zeroizing::new(vec![0u8; KEYFILE_LEN]);
    rand::rng().fill_bytes(&mut keyfile);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                StrongboxError::KeyfileError(format!("cannot create keyfile directory: {e}"))
            })?;
        }
    }

    fs::write(path, keyfile.as_slice())
        .map_err(|e| StrongboxError::KeyfileError(format!("failed to write keyfile: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
            StrongboxError::KeyfileError(format!("failed to set keyfile permissions: {e}"))
        })?;
    }

    Ok(keyfile)
}

/// Load a keyfile from disk.  Any non-empty file is accepted.
pub fn load_keyfile(path: &Path) -> Result<Zeroizing<Vec<u8>>> {
    if !path.exists() {
        return Err(StrongboxError::KeyfileError(format!(
            "keyfile not found at {}",
            path.display()
        )));
    }

    let data = Zeroizing::new(
        fs::read(path)
            .map_err(|e| StrongboxError::KeyfileError(format!("failed to read keyfile: {e}")))?,
    );

    if data.is_empty() {
        return Err(StrongboxError::KeyfileError(format!(
            "keyfile at {} is empty",
            path.display()
        )));
    }

    Ok(data)
}

/// `passphrase || HMAC-SHA512(key = keyfile, msg = passphrase)`.
pub fn combine_passphrase_keyfile(
    passphrase: &[u8],
    keyfile: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut mac = Hmac::<Sha512>::new_from_slice(keyfile)
        .map_err(|e| StrongboxError::KeyfileError(format!("HMAC init failed: {e}")))?;
    mac.update(passphrase);
    let tag = mac.finalize().into_bytes();

    let mut combined = Zeroizing::new(Vec::with_capacity(passphrase.len() + tag.len()));
    combined.extend_from_slice(passphrase);
    combined.extend_from_slice(&tag);
    Ok(combined)
}

/// `passphrase || SHA-512(keyfile)`, as used by legacy vaults.
pub fn combine_passphrase_keyfile_legacy(passphrase: &[u8], keyfile: &[u8]) -> Zeroizing<Vec<u8>> {
    let digest = Sha512::digest(keyfile);
    let mut combined = Zeroizing::new(Vec::with_capacity(passphrase.len() + digest.len()));
    combined.extend_from_slice(passphrase);
    combined.extend_from_slice(&digest);
    combined
}
