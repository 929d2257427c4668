use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::encryption::Cipher;
use crate::crypto::kdf::check_iterations;
use crate::errors::{Result, StrongboxError};
use crate::vault::VaultOptions;

/// User-level configuration, loaded from `strongbox.toml`.
///
/// Every field has a sensible default so Strongbox works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file used when `--vault` is not given.  `~/` is expanded.
    #[serde(default = "default_vault")]
    pub default_vault: String,

    /// Copy the vault aside before the first save of each session.
    #[serde(default)]
    pub make_backups: bool,

    /// Cipher for saves.  Unset keeps whatever the file was sealed with.
    #[serde(default)]
    pub cipher: Option<Cipher>,

    /// Pin the PBKDF2 cost for new vaults instead of calibrating.
    #[serde(default)]
    pub iterations: Option<u32>,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault() -> String {
    "~/.strongbox.sbx".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_vault: default_vault(),
            make_backups: false,
            cipher: None,
            iterations: None,
        }
    }
}

impl Settings {
    /// Name of the config file inside the config directory.
    pub const FILE_NAME: &'static str = "strongbox.toml";

    /// Load settings from `<config_dir>/strongbox.toml`.
    ///
    /// If the file does not exist, defaults are returned.  If it exists
    /// but cannot be parsed or holds an out-of-range value, an error is
    /// returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            StrongboxError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if let Some(iterations) = settings.iterations {
            check_iterations(iterations).map_err(|e| {
                StrongboxError::ConfigError(format!("{}: {e}", config_path.display()))
            })?;
        }

        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Default configuration directory: `<platform config dir>/strongbox`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("strongbox"))
    }

    /// Resolve the vault path, preferring an explicit override.
    pub fn vault_path(&self, explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => expand_home(&self.default_vault),
        }
    }

    /// Convert to store-level options.
    pub fn vault_options(&self) -> VaultOptions {
        VaultOptions {
            cipher: self.cipher,
            iterations: self.iterations,
            make_backups: self.make_backups,
        }
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

// ── Tests ────────────────────────────────────────────────────────────
