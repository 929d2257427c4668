//! `strongbox passphrase`: change the vault passphrase.
//!
//! The vault is re-encrypted under a key derived from the new
//! passphrase and a fresh salt, then written atomically.

use std::path::Path;

use crate::cli::output;
use crate::cli::{
    load_keyfile, load_settings, prompt_new_passphrase, prompt_passphrase, vault_path, Cli,
    NEW_PASSPHRASE_ENV,
};
use crate::crypto::keyfile::load_keyfile as read_keyfile;
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `passphrase` command.
pub fn execute(cli: &Cli, new_keyfile: Option<&Path>) -> Result<()> {
    let settings = load_settings(cli)?;
    let path = vault_path(cli, &settings);

    // 1. Open the vault with the current credentials.
    output::info("Enter your current vault passphrase.");
    let keyfile = load_keyfile(cli)?;
    let current = prompt_passphrase("Current vault passphrase")?;
    let current_keyfile = keyfile.as_deref().map(|k| k.as_slice());
    let mut store = VaultStore::open(
        &path,
        current.as_bytes(),
        current_keyfile,
        &settings.vault_options(),
    )?;

    // 2. Prompt for the new passphrase.
    output::info("Choose your new vault passphrase.");
    let new_passphrase = prompt_new_passphrase(NEW_PASSPHRASE_ENV)?;

    // 3. Keep the existing keyfile unless a new one was given.
    let replacement = new_keyfile.map(read_keyfile).transpose()?;
    let next_keyfile = match &replacement {
        Some(bytes) => Some(bytes.as_slice()),
        None => current_keyfile,
    };

    // 4. Re-key and save atomically.
    store.change_passphrase(
        current.as_bytes(),
        current_keyfile,
        new_passphrase.as_bytes(),
        next_keyfile,
    )?;

    output::success(&format!(
        "Passphrase changed for {} ({} entries re-encrypted)",
        store.path().display(),
        store.len()
    ));
    if new_keyfile.is_some() {
        output::info("The vault now requires the new keyfile.");
    }
    Ok(())
}
