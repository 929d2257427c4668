//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{Result, StrongboxError};
use crate::vault::VaultStore;

/// Environment variable holding the vault passphrase (scripts, CI).
pub const PASSPHRASE_ENV: &str = "STRONGBOX_PASSPHRASE";

/// Environment variable holding the replacement passphrase for
/// `strongbox passphrase`.
pub const NEW_PASSPHRASE_ENV: &str = "STRONGBOX_NEW_PASSPHRASE";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "STRONGBOX_LOG";

/// Minimum length for newly chosen passphrases.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Strongbox CLI: encrypted password vault.
#[derive(Parser)]
#[command(name = "strongbox", about = "Encrypted password vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: `default_vault` from the config file)
    #[arg(long, global = true, env = "STRONGBOX_VAULT")]
    pub vault: Option<PathBuf>,

    /// Path to a keyfile for two-factor vault access
    #[arg(long, global = true)]
    pub keyfile: Option<PathBuf>,

    /// Directory holding strongbox.toml
    #[arg(long, global = true, env = "STRONGBOX_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// List entries, sorted by group and name
    List,

    /// Show one entry
    Show {
        /// Entry number as shown by `list`
        number: usize,
        /// Print the password instead of masking it
        #[arg(long)]
        reveal: bool,
    },

    /// Add an entry
    Add {
        /// Entry name (no '/' or '\')
        name: String,
        /// Group segment; repeat for nested groups (-g work -g email)
        #[arg(short, long, value_name = "SEGMENT")]
        group: Vec<String>,
        #[arg(short, long, default_value = "")]
        username: String,
        #[arg(short, long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(short, long, default_value = "")]
        comment: String,
        /// Generate a random password of this length instead of prompting
        #[arg(long, value_name = "LENGTH")]
        generate: Option<usize>,
    },

    /// Change one field of an entry
    Edit {
        /// Entry number as shown by `list`
        number: usize,
        /// name, username, password, email, url, group or comment
        field: String,
        /// New value (omit for an interactive prompt)
        value: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry number as shown by `list`
        number: usize,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Print a random password
    Generate {
        #[arg(short, long, default_value_t = 20)]
        length: usize,
        #[arg(long)]
        no_uppercase: bool,
        #[arg(long)]
        no_lowercase: bool,
        #[arg(long)]
        no_digits: bool,
        #[arg(long)]
        no_punctuation: bool,
    },

    /// Change the vault passphrase (and optionally its keyfile)
    Passphrase {
        /// Keyfile to require from now on
        #[arg(long)]
        new_keyfile: Option<PathBuf>,
    },

    /// Generate a new random keyfile
    Keyfile {
        /// Where to write the keyfile
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Install the tracing subscriber.  Filter comes from `STRONGBOX_LOG`
/// (default `warn`); output goes to stderr.
pub fn init_logging() {
    use tracing_subscriber::{filter::EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Get the vault passphrase from `STRONGBOX_PASSPHRASE` or a prompt.
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| StrongboxError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase, asked twice.
///
/// `env_var` lets scripts supply it instead.  Enforces a minimum length.
pub fn prompt_new_passphrase(env_var: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            check_new_passphrase(&pw)?;
            return Ok(Zeroizing::new(pw));
        }
    }

    let first = Zeroizing::new(
        dialoguer::Password::new()
            .with_prompt("Choose vault passphrase")
            .interact()
            .map_err(|e| StrongboxError::CommandFailed(format!("passphrase prompt: {e}")))?,
    );
    check_new_passphrase(&first)?;

    let second = Zeroizing::new(
        dialoguer::Password::new()
            .with_prompt("Confirm vault passphrase")
            .interact()
            .map_err(|e| StrongboxError::CommandFailed(format!("passphrase prompt: {e}")))?,
    );
    if *first != *second {
        return Err(StrongboxError::PasswordMismatch);
    }

    Ok(first)
}

fn check_new_passphrase(pw: &str) -> Result<()> {
    if pw.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(StrongboxError::Validation(format!(
            "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
        )));
    }
    Ok(())
}

/// Read a field value from, in order: the command line, piped stdin,
/// or an interactive prompt (hidden when `hidden` is set).
pub fn read_value(inline: Option<&str>, prompt: &str, hidden: bool) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        if hidden {
            output::warning("Value provided on command line; it may appear in shell history.");
        }
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    let value = if hidden {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
    } else {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    }
    .map_err(|e| StrongboxError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Load settings from `--config-dir`, or the platform config directory.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    match cli.config_dir.clone().or_else(Settings::default_dir) {
        Some(dir) => Settings::load(&dir),
        None => Ok(Settings::default()),
    }
}

/// Resolve the vault file from `--vault` or the settings.
pub fn vault_path(cli: &Cli, settings: &Settings) -> PathBuf {
    settings.vault_path(cli.vault.as_deref())
}

/// Load keyfile bytes from `--keyfile`, if given.
pub fn load_keyfile(cli: &Cli) -> Result<Option<Zeroizing<Vec<u8>>>> {
    cli.keyfile
        .as_deref()
        .map(crate::crypto::keyfile::load_keyfile)
        .transpose()
}

/// Open the vault selected by the CLI arguments, prompting as needed.
pub fn open_vault(cli: &Cli) -> Result<VaultStore> {
    let settings = load_settings(cli)?;
    let path = vault_path(cli, &settings);
    if !path.exists() {
        output::tip("Run `strongbox init` to create a vault.");
        return Err(StrongboxError::VaultNotFound(path));
    }

    let keyfile = load_keyfile(cli)?;
    let passphrase = prompt_passphrase("Enter vault passphrase")?;
    VaultStore::open(
        &path,
        passphrase.as_bytes(),
        keyfile.as_deref().map(|k| k.as_slice()),
        &settings.vault_options(),
    )
}

/// Convert a 1-based entry number from the command line to a display
/// index.
pub fn display_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or(StrongboxError::EntryNotFound(number))
}

/// Report store errors using the 1-based numbers the user typed.
pub fn numbered<T>(result: Result<T>) -> Result<T> {
    result.map_err(|e| match e {
        StrongboxError::EntryNotFound(index) => StrongboxError::EntryNotFound(index + 1),
        other => other,
    })
}
