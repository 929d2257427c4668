//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is calibrated once, when a vault is created, so
//! that one derivation costs roughly half a second on the creating
//! machine.  It is stored in the vault envelope and reused on every
//! open, so later unlocks never re-time anything.

use std::time::{Duration, Instant};

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

use super::keys::MasterKey;
use crate::errors::{Result, StrongboxError};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Floor for both calibrated and configured iteration counts.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Ceiling for every iteration count, including the one read from a
/// vault header.  Keeps a tampered header from stalling an open.
pub const MAX_ITERATIONS: u32 = 50_000_000;

/// Rounds used for the timing trial.
const TRIAL_ITERATIONS: u32 = 10_000;

/// Target cost of one full derivation.
const TARGET_DURATION: Duration = Duration::from_millis(500);

/// Derive a 32-byte key from `auth` and `salt`.
///
/// The same inputs always produce the same key.
pub fn derive_key(auth: &[u8], salt: &[u8], iterations: u32) -> Result<MasterKey> {
    if iterations == 0 {
        return Err(StrongboxError::KeyDerivationFailed(
            "PBKDF2 iterations must be at least 1".into(),
        ));
    }
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(auth, salt, iterations, &mut key);
    Ok(MasterKey::new(key))
}

/// Reject configured iteration counts outside the floor and ceiling.
pub fn check_iterations(iterations: u32) -> Result<u32> {
    if iterations < MIN_ITERATIONS {
        return Err(StrongboxError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_ITERATIONS} (got {iterations})"
        )));
    }
    if iterations > MAX_ITERATIONS {
        return Err(StrongboxError::KeyDerivationFailed(format!(
            "PBKDF2 iterations cannot exceed {MAX_ITERATIONS} (got {iterations})"
        )));
    }
    Ok(iterations)
}

/// Time a short PBKDF2 run and scale it to the target duration.
pub fn calibrate_iterations() -> u32 {
    let mut scratch = [0u8; KEY_LEN];
    let start = Instant::now();
    pbkdf2_hmac::<Sha256>(b"calibration", b"salt", TRIAL_ITERATIONS, &mut scratch);
    let elapsed = start.elapsed();

    let iterations = scale_iterations(elapsed);
    debug!(?elapsed, iterations, "calibrated PBKDF2 cost");
    iterations
}

/// Scale the trial run so a full derivation takes about `TARGET_DURATION`,
/// clamped to `MIN_ITERATIONS..=MAX_ITERATIONS`.
pub fn scale_iterations(trial: Duration) -> u32 {
    let trial_nanos = trial.as_nanos().max(1);
    let factor = TARGET_DURATION.as_nanos() / trial_nanos;
    let scaled = u128::from(TRIAL_ITERATIONS) * factor;
    u32::try_from(scaled)
        .unwrap_or(u32::MAX)
        .clamp(MIN_ITERATIONS, MAX_ITERATIONS)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
