//! `strongbox add`: add a new entry to the vault.

use crate::cli::output;
use crate::cli::{open_vault, read_value, Cli};
use crate::crypto::password::{generate_password, PasswordClasses};
use crate::errors::Result;
use crate::vault::groups::join_segments;
use crate::vault::NewEntry;

/// Text fields given on the command line.
pub struct AddArgs<'a> {
    pub name: &'a str,
    /// Group segments, outermost first.
    pub group: &'a [String],
    pub username: &'a str,
    pub email: &'a str,
    pub url: &'a str,
    pub comment: &'a str,
    pub generate: Option<usize>,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: &AddArgs<'_>) -> Result<()> {
    // Resolve the password before unlocking so a bad length fails fast.
    let generated = args.generate.is_some();
    let password = match args.generate {
        Some(length) => generate_password(length, PasswordClasses::ALL)?,
        None => read_value(None, &format!("Password for {}", args.name), true)?.to_string(),
    };

    let mut store = open_vault(cli)?;
    let index = store.add_entry(NewEntry {
        name: args.name.to_string(),
        username: args.username.to_string(),
        password,
        email: args.email.to_string(),
        url: args.url.to_string(),
        group: join_segments(args.group),
        comment: args.comment.to_string(),
    })?;
    store.save()?;

    let label = store.entry(index)?.label();
    output::success(&format!(
        "Added entry {} '{label}' ({} total)",
        index + 1,
        store.len()
    ));
    if generated {
        output::tip(&format!("Run `strongbox show {} --reveal` to see the password.", index + 1));
    }
    Ok(())
}
