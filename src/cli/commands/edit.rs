//! `strongbox edit`: change one field of an entry.

use crate::cli::output;
use crate::cli::{display_index, numbered, open_vault, read_value, Cli};
use crate::errors::Result;
use crate::vault::EntryField;

/// Execute the `edit` command.
pub fn execute(cli: &Cli, number: usize, field: &str, value: Option<&str>) -> Result<()> {
    let index = display_index(number)?;
    let field: EntryField = field.parse()?;

    let mut store = open_vault(cli)?;
    let label = numbered(store.entry(index))?.label();

    let hidden = field == EntryField::Password;
    let value = read_value(value, &format!("New {field} for {label}"), hidden)?;

    let new_index = numbered(store.edit_entry(index, field, &value))?;
    store.save()?;

    let new_label = store.entry(new_index)?.label();
    output::success(&format!("Updated {field} of '{new_label}'"));
    if new_index != index {
        output::info(&format!("Entry is now number {}", new_index + 1));
    }
    Ok(())
}
