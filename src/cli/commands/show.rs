//! `strongbox show`: print one entry.

use crate::cli::output;
use crate::cli::{display_index, numbered, open_vault, Cli};
use crate::errors::Result;

/// Execute the `show` command.
pub fn execute(cli: &Cli, number: usize, reveal: bool) -> Result<()> {
    let index = display_index(number)?;
    let store = open_vault(cli)?;
    let entry = numbered(store.entry(index))?;
    output::print_entry(entry, reveal);
    Ok(())
}
