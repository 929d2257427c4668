//! `strongbox init`: create a new, empty vault.

use std::fs;

use crate::cli::output;
use crate::cli::{load_keyfile, load_settings, prompt_new_passphrase, vault_path, Cli, PASSPHRASE_ENV};
use crate::errors::{Result, StrongboxError};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let path = vault_path(cli, &settings);

    if path.exists() {
        output::tip("Use `strongbox add` to add entries to the existing vault.");
        return Err(StrongboxError::VaultAlreadyExists(path));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            output::info(&format!("Created directory: {}", parent.display()));
        }
    }

    let passphrase = prompt_new_passphrase(PASSPHRASE_ENV)?;
    let keyfile = load_keyfile(cli)?;

    if settings.iterations.is_none() {
        output::info("Calibrating key derivation cost...");
    }
    let store = VaultStore::create(
        &path,
        passphrase.as_bytes(),
        keyfile.as_deref().map(|k| k.as_slice()),
        &settings.vault_options(),
    )?;

    if store.has_keyfile() {
        output::info("Vault created with keyfile; pass --keyfile on every command.");
    }
    output::success(&format!(
        "Vault created at {} ({} PBKDF2 iterations, {})",
        path.display(),
        store.iterations(),
        store.cipher()
    ));
    output::tip("Run `strongbox add <NAME>` to add an entry.");

    Ok(())
}
