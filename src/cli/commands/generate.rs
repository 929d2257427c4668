//! `strongbox generate`: print a random password without touching a vault.

use crate::crypto::password::{generate_password, PasswordClasses};
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(length: usize, classes: PasswordClasses) -> Result<()> {
    let password = generate_password(length, classes)?;
    println!("{password}");
    Ok(())
}
