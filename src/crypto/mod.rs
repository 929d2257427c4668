//! Cryptographic primitives.
//!
//! - PBKDF2-HMAC-SHA256 key derivation and cost calibration (`kdf`)
//! - Keyfile generation and passphrase/keyfile mixing (`keyfile`)
//! - Zeroize-on-drop key and credential holders (`keys`)
//! - AES-256-GCM / ChaCha20-Poly1305 with counter nonces (`encryption`)
//! - The vault file envelope and decryption schemes (`envelope`)
//! - Random password generation (`password`)

pub mod encryption;
pub mod envelope;
pub mod kdf;
pub mod keyfile;
pub mod keys;
pub mod password;

pub use encryption::{decrypt, encrypt, Cipher, NonceCounter};
pub use envelope::{open_vault, seal_vault, Opened, Scheme, DECRYPT_SCHEMES};
pub use kdf::{calibrate_iterations, derive_key, generate_salt, MAX_ITERATIONS, MIN_ITERATIONS};
pub use keyfile::{generate_keyfile, load_keyfile};
pub use keys::{Credentials, MasterKey};
pub use password::{generate_password, generate_password_with, PasswordClasses};
