use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in Strongbox.
#[derive(Debug, Error)]
pub enum StrongboxError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Incorrect passphrase/keyfile or corrupted vault file")]
    AuthenticationFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Invalid vault file: {0}")]
    InvalidVaultFile(String),

    #[error("Corrupted vault file")]
    CorruptedVault,

    #[error("Entry {0} not found")]
    EntryNotFound(usize),

    #[error("{0}")]
    Validation(String),

    #[error("Current passphrase/keyfile is incorrect")]
    IncorrectPassphrase,

    // --- Keyfile errors ---
    #[error("Keyfile error: {0}")]
    KeyfileError(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Passphrases do not match")]
    PasswordMismatch,
}

/// Convenience type alias for Strongbox results.
pub type Result<T> = std::result::Result<T, StrongboxError>;
