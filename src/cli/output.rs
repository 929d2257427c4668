//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::groups::split_segments;
use crate::vault::{Entry, ListedEntry};

/// Shown instead of a password unless `--reveal` is given.
const MASK: &str = "********";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print the sorted entry listing (No., Entry, Username, Modified).
///
/// Numbers are 1-based display positions.
pub fn print_entries_table(entries: &[ListedEntry<'_>]) {
    if entries.is_empty() {
        info("No entries in this vault yet.");
        tip("Run `strongbox add <NAME>` to add your first entry.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["No.", "Entry", "Username", "Modified"]);

    for listed in entries {
        table.add_row(vec![
            (listed.display_index + 1).to_string(),
            listed.label(),
            listed.entry.username.clone(),
            listed.entry.modified_display(),
        ]);
    }

    println!("{table}");
}

/// Print every field of one entry as a two-column table.
pub fn print_entry(entry: &Entry, reveal: bool) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let password = if reveal {
        entry.password.clone()
    } else {
        MASK.to_string()
    };

    for (field, value) in [
        ("Name", entry.name.clone()),
        ("Group", split_segments(&entry.group).join(" > ")),
        ("Username", entry.username.clone()),
        ("Password", password),
        ("Email", entry.email.clone()),
        ("URL", entry.url.clone()),
        ("Comment", entry.comment.clone()),
        ("Created", entry.created_display()),
        ("Modified", entry.modified_display()),
    ] {
        table.add_row(vec![style(field).bold().to_string(), value]);
    }

    println!("{table}");
}
