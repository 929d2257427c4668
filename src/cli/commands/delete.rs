//! `strongbox delete`: remove an entry from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{display_index, numbered, open_vault, Cli};
use crate::errors::{Result, StrongboxError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, number: usize, force: bool) -> Result<()> {
    let index = display_index(number)?;
    let mut store = open_vault(cli)?;
    let label = numbered(store.entry(index))?.label();

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry '{label}'?"))
            .default(false)
            .interact()
            .map_err(|e| StrongboxError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            return Err(StrongboxError::UserCancelled);
        }
    }

    numbered(store.delete_entry(index))?;
    store.save()?;

    output::success(&format!("Deleted entry '{label}'"));
    Ok(())
}
