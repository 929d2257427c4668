//! `strongbox keyfile`: write a new random keyfile.

use std::path::Path;

use crate::cli::output;
use crate::crypto::keyfile::generate_keyfile;
use crate::errors::Result;

/// Execute the `keyfile` command.
pub fn execute(path: &Path) -> Result<()> {
    generate_keyfile(path)?;
    output::success(&format!("Keyfile written to {}", path.display()));
    output::warning("Keep a copy somewhere safe; a vault that needs it cannot be opened without it.");
    output::tip("Use `strongbox init --keyfile <PATH>` or `strongbox passphrase --new-keyfile <PATH>`.");
    Ok(())
}
