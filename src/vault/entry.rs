//! Credential records stored inside a vault.
//!
//! One `Entry` per record, kept in insertion (storage) order by the
//! store.  All text fields are wiped from memory when an entry drops.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::groups::validate_group_path;
use crate::errors::{Result, StrongboxError};

/// Maximum byte length of the single-byte-prefixed fields.
pub const MAX_SHORT_FIELD: usize = 255;

/// Maximum byte length of the password and comment fields.
pub const MAX_LONG_FIELD: usize = 65_535;

/// Display format for timestamps (local time, 24-hour clock).
pub const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// A single credential record.
#[derive(Clone, PartialEq, Eq, Default, Zeroize, ZeroizeOnDrop)]
pub struct Entry {
    pub name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub url: String,
    /// `/`-separated group path, empty when ungrouped.
    pub group: String,
    pub comment: String,
    /// Seconds since the Unix epoch.
    pub created: u64,
    /// Seconds since the Unix epoch.
    pub modified: u64,
}

// Hand-written so passwords never end up in debug output or logs.
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("created", &self.created)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl Entry {
    /// Label shown to the user: `group/name`, or just `name`.
    pub fn label(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.group, self.name)
        }
    }

    /// Check every field against its length and character limits.
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_len("username", &self.username, MAX_SHORT_FIELD)?;
        validate_len("password", &self.password, MAX_LONG_FIELD)?;
        validate_len("email", &self.email, MAX_SHORT_FIELD)?;
        validate_len("url", &self.url, MAX_SHORT_FIELD)?;
        validate_len("comment", &self.comment, MAX_LONG_FIELD)?;
        validate_group_path(&self.group)
    }

    /// Created timestamp rendered in local time.
    pub fn created_display(&self) -> String {
        format_timestamp(self.created)
    }

    /// Modified timestamp rendered in local time.
    pub fn modified_display(&self) -> String {
        format_timestamp(self.modified)
    }

    /// Read one field as text.
    pub fn field(&self, field: EntryField) -> &str {
        match field {
            EntryField::Name => &self.name,
            EntryField::Username => &self.username,
            EntryField::Password => &self.password,
            EntryField::Email => &self.email,
            EntryField::Url => &self.url,
            EntryField::Group => &self.group,
            EntryField::Comment => &self.comment,
        }
    }

    pub(crate) fn field_mut(&mut self, field: EntryField) -> &mut String {
        match field {
            EntryField::Name => &mut self.name,
            EntryField::Username => &mut self.username,
            EntryField::Password => &mut self.password,
            EntryField::Email => &mut self.email,
            EntryField::Url => &mut self.url,
            EntryField::Group => &mut self.group,
            EntryField::Comment => &mut self.comment,
        }
    }
}

/// User-supplied fields for a new entry.  Timestamps are filled in by
/// the store when the entry is committed.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct NewEntry {
    pub name: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub url: String,
    pub group: String,
    pub comment: String,
}

impl NewEntry {
    /// Build a full entry stamped with `now`.
    pub fn into_entry(mut self, now: u64) -> Entry {
        Entry {
            name: std::mem::take(&mut self.name),
            username: std::mem::take(&mut self.username),
            password: std::mem::take(&mut self.password),
            email: std::mem::take(&mut self.email),
            url: std::mem::take(&mut self.url),
            group: std::mem::take(&mut self.group),
            comment: std::mem::take(&mut self.comment),
            created: now,
            modified: now,
        }
    }
}

/// Editable text fields of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Name,
    Username,
    Password,
    Email,
    Url,
    Group,
    Comment,
}

impl EntryField {
    pub const ALL: [EntryField; 7] = [
        EntryField::Name,
        EntryField::Username,
        EntryField::Password,
        EntryField::Email,
        EntryField::Url,
        EntryField::Group,
        EntryField::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntryField::Name => "name",
            EntryField::Username => "username",
            EntryField::Password => "password",
            EntryField::Email => "email",
            EntryField::Url => "url",
            EntryField::Group => "group",
            EntryField::Comment => "comment",
        }
    }
}

impl fmt::Display for EntryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryField {
    type Err = StrongboxError;

    fn from_str(s: &str) -> Result<Self> {
        EntryField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                StrongboxError::Validation(format!(
                    "unknown field '{s}' (expected one of name, username, password, email, url, group, comment)"
                ))
            })
    }
}

/// Current wall-clock time in seconds since the epoch.
pub fn now_timestamp() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Render epoch seconds as `YYYY-MM-DD hh:mm:ss` in local time.
pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|dt| dt.with_timezone(&Local).format(TIME_LAYOUT).to_string())
        .unwrap_or_else(|| "invalid time".to_string())
}

/// An entry name must be 1..=255 bytes and free of path separators.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StrongboxError::Validation(
            "entry name cannot be empty".into(),
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(StrongboxError::Validation(format!(
            "entry name '{name}' cannot contain '/' or '\\'"
        )));
    }
    validate_len("name", name, MAX_SHORT_FIELD)
}

fn validate_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(StrongboxError::Validation(format!(
            "{field} cannot exceed {max} bytes (got {})",
            value.len()
        )));
    }
    Ok(())
}
