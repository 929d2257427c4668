//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` ties the payload codec to the crypto envelope so the
//! rest of the application works with simple calls like
//! `store.add_entry(new)` followed by `store.save()`.
//!
//! Entry numbers passed in and out of the store are *display indices*:
//! positions in the sorted label list.  They are mapped to storage
//! indices through `name_groups(..).order` on every call.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::encryption::{Cipher, NonceCounter};
use crate::crypto::envelope::{self, current_scheme};
use crate::crypto::kdf::{calibrate_iterations, check_iterations, generate_salt, SALT_LEN};
use crate::crypto::keys::Credentials;
use crate::errors::{Result, StrongboxError};

use super::entry::{now_timestamp, Entry, EntryField, NewEntry};
use super::format::{decode_payload, encode_payload, PROTOCOL_VERSION};
use super::groups::{has_duplicate_name_groups, name_groups, MAX_GROUP_POINTER};

/// Knobs that come from configuration rather than from the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultOptions {
    /// Cipher for the next save.  `None` keeps whatever opened the file
    /// (AES-256-GCM for new vaults).
    pub cipher: Option<Cipher>,
    /// Pinned PBKDF2 iteration count for new vaults.  `None` calibrates.
    pub iterations: Option<u32>,
    /// Write a timestamped copy of the original file on the first save.
    pub make_backups: bool,
}

/// One row of the sorted entry listing.
#[derive(Debug, Clone, Copy)]
pub struct ListedEntry<'a> {
    pub display_index: usize,
    pub storage_index: usize,
    pub entry: &'a Entry,
}

impl ListedEntry<'_> {
    pub fn label(&self) -> String {
        self.entry.label()
    }
}

/// The main vault handle.  Create one with `VaultStore::create` or
/// `VaultStore::open`, then use its methods to manage entries.
pub struct VaultStore {
    /// Path to the vault file on disk.
    path: PathBuf,

    /// Entries in storage (insertion) order.
    entries: Vec<Entry>,

    /// Passphrase and keyfile bytes, wiped on drop.
    credentials: Credentials,

    iterations: u32,
    salt: [u8; SALT_LEN],
    counter: NonceCounter,
    cipher: Cipher,

    /// Payload version found on open; `PROTOCOL_VERSION` for new vaults.
    format_version: u16,

    /// Name of the scheme that opened the file, if it was opened.
    opened_with: Option<&'static str>,

    make_backups: bool,
    /// File contents as read at open time, kept for the backup.
    original: Option<Vec<u8>>,
    backup_written: bool,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new vault file at `path` and persist it empty.
    ///
    /// Generates a fresh salt and either calibrates the PBKDF2 cost or
    /// uses the pinned count from `options`.
    pub fn create(
        path: &Path,
        passphrase: &[u8],
        keyfile: Option<&[u8]>,
        options: &VaultOptions,
    ) -> Result<Self> {
        if path.exists() {
            return Err(StrongboxError::VaultAlreadyExists(path.to_path_buf()));
        }

        let iterations = match options.iterations {
            Some(pinned) => check_iterations(pinned)?,
            None => calibrate_iterations(),
        };

        let mut store = Self {
            path: path.to_path_buf(),
            entries: Vec::new(),
            credentials: Credentials::new(passphrase, keyfile),
            iterations,
            salt: generate_salt(),
            counter: NonceCounter::default(),
            cipher: options.cipher.unwrap_or_default(),
            format_version: PROTOCOL_VERSION,
            opened_with: None,
            make_backups: options.make_backups,
            original: None,
            backup_written: false,
        };

        store.save()?;
        info!(
            path = %path.display(),
            iterations,
            cipher = %store.cipher,
            keyfile = keyfile.is_some(),
            "created vault"
        );
        Ok(store)
    }

    /// Open an existing vault file.
    ///
    /// Fails with `AuthenticationFailed` when no decryption scheme
    /// accepts the credentials, and with `CorruptedVault` when the
    /// decrypted payload is malformed.
    pub fn open(
        path: &Path,
        passphrase: &[u8],
        keyfile: Option<&[u8]>,
        options: &VaultOptions,
    ) -> Result<Self> {
        if !path.exists() {
            return Err(StrongboxError::VaultNotFound(path.to_path_buf()));
        }

        let data = fs::read(path)?;
        let credentials = Credentials::new(passphrase, keyfile);
        let opened = envelope::open_vault(&credentials, &data)?;
        let decoded = decode_payload(&opened.plaintext)?;

        if opened.scheme.is_legacy() {
            warn!(
                scheme = opened.scheme.name,
                "vault uses a legacy encryption scheme; it will be upgraded on the next save"
            );
        }
        debug!(
            path = %path.display(),
            scheme = opened.scheme.name,
            version = decoded.version,
            entries = decoded.entries.len(),
            "opened vault"
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries: decoded.entries,
            credentials,
            iterations: opened.iterations,
            salt: opened.salt,
            counter: opened.counter,
            cipher: options.cipher.unwrap_or(opened.scheme.cipher),
            format_version: decoded.version,
            opened_with: Some(opened.scheme.name),
            make_backups: options.make_backups,
            original: options.make_backups.then_some(data),
            backup_written: false,
        })
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encode, encrypt and atomically replace the vault file.
    ///
    /// The new file is built entirely in memory first.  When backups are
    /// enabled, the file as it was at open time is copied aside before
    /// the first save of the session.
    pub fn save(&mut self) -> Result<()> {
        let payload = Zeroizing::new(encode_payload(&self.entries)?);
        let scheme = current_scheme(self.cipher);
        let bytes = envelope::seal_vault(
            scheme,
            &self.credentials,
            self.iterations,
            &self.salt,
            &mut self.counter,
            &payload,
        )?;

        self.write_backup_once()?;
        write_atomic(&self.path, &bytes)?;
        self.format_version = PROTOCOL_VERSION;

        debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            scheme = scheme.name,
            "saved vault"
        );
        Ok(())
    }

    fn write_backup_once(&mut self) -> Result<()> {
        if !self.make_backups || self.backup_written {
            return Ok(());
        }
        if let Some(original) = &self.original {
            let backup = backup_path(&self.path, Local::now());
            write_atomic(&backup, original)?;
            info!(backup = %backup.display(), "wrote vault backup");
        }
        self.backup_written = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Entry operations
    // ------------------------------------------------------------------

    /// All entries in display order.
    pub fn list_entries(&self) -> Vec<ListedEntry<'_>> {
        name_groups(&self.entries)
            .order
            .into_iter()
            .enumerate()
            .map(|(display_index, storage_index)| ListedEntry {
                display_index,
                storage_index,
                entry: &self.entries[storage_index],
            })
            .collect()
    }

    /// The entry shown at `display_index`.
    pub fn entry(&self, display_index: usize) -> Result<&Entry> {
        let index = self.storage_index(display_index)?;
        Ok(&self.entries[index])
    }

    /// Validate and append a new entry.  Returns its display index.
    pub fn add_entry(&mut self, new: NewEntry) -> Result<usize> {
        let entry = new.into_entry(now_timestamp());
        entry.validate()?;
        self.check_collisions(&entry, None)?;

        debug!(group = %entry.group, "adding entry");
        self.entries.push(entry);
        let storage_index = self.entries.len() - 1;
        self.display_index_of(storage_index)
    }

    /// Replace one field of the entry at `display_index`.
    ///
    /// The entry is rebuilt and validated before the stored copy is
    /// touched, so a rejected edit leaves the vault unchanged.  Returns
    /// the entry's display index after the edit.
    pub fn edit_entry(
        &mut self,
        display_index: usize,
        field: EntryField,
        value: &str,
    ) -> Result<usize> {
        let index = self.storage_index(display_index)?;

        let mut updated = self.entries[index].clone();
        *updated.field_mut(field) = value.to_string();
        updated.modified = now_timestamp().max(updated.created);
        updated.validate()?;
        if matches!(field, EntryField::Name | EntryField::Group) {
            self.check_collisions(&updated, Some(index))?;
        }

        debug!(%field, "editing entry");
        self.entries[index] = updated;
        self.display_index_of(index)
    }

    /// Remove the entry at `display_index` and return it.
    pub fn delete_entry(&mut self, display_index: usize) -> Result<Entry> {
        let index = self.storage_index(display_index)?;
        debug!("deleting entry");
        Ok(self.entries.remove(index))
    }

    /// Verify the current credentials, then re-key the vault.
    ///
    /// A fresh salt is generated; the nonce counter carries on.  If the
    /// save fails the handle keeps its previous credentials and salt.
    pub fn change_passphrase(
        &mut self,
        current_passphrase: &[u8],
        current_keyfile: Option<&[u8]>,
        new_passphrase: &[u8],
        new_keyfile: Option<&[u8]>,
    ) -> Result<()> {
        let current = Credentials::new(current_passphrase, current_keyfile);
        if !current.matches(&self.credentials)? {
            return Err(StrongboxError::IncorrectPassphrase);
        }

        let previous_credentials = std::mem::replace(
            &mut self.credentials,
            Credentials::new(new_passphrase, new_keyfile),
        );
        let previous_salt = std::mem::replace(&mut self.salt, generate_salt());
        if let Err(e) = self.save() {
            self.credentials = previous_credentials;
            self.salt = previous_salt;
            return Err(e);
        }

        info!(keyfile = new_keyfile.is_some(), "changed vault passphrase");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in storage order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Value of the nonce counter used by the last encryption.
    pub fn nonce_counter(&self) -> u64 {
        self.counter.value()
    }

    pub fn format_version(&self) -> u16 {
        self.format_version
    }

    pub fn opened_with(&self) -> Option<&'static str> {
        self.opened_with
    }

    pub fn has_keyfile(&self) -> bool {
        self.credentials.has_keyfile()
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    fn storage_index(&self, display_index: usize) -> Result<usize> {
        name_groups(&self.entries)
            .order
            .get(display_index)
            .copied()
            .ok_or(StrongboxError::EntryNotFound(display_index))
    }

    fn display_index_of(&self, storage_index: usize) -> Result<usize> {
        name_groups(&self.entries)
            .order
            .iter()
            .position(|&i| i == storage_index)
            .ok_or(StrongboxError::EntryNotFound(storage_index))
    }

    /// Reject `candidate` if its label clashes with another entry, or if
    /// it would push the vault past the group-pointer limit.
    fn check_collisions(&self, candidate: &Entry, replacing: Option<usize>) -> Result<()> {
        let others = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != replacing)
            .map(|(_, e)| e);

        let mut labels: Vec<String> = others.clone().map(Entry::label).collect();
        labels.push(candidate.label());
        if has_duplicate_name_groups(&labels) {
            return Err(StrongboxError::Validation(format!(
                "an entry named '{}' already exists",
                candidate.label()
            )));
        }

        let mut groups: HashSet<&str> = others
            .map(|e| e.group.as_str())
            .filter(|g| !g.is_empty())
            .collect();
        if !candidate.group.is_empty() {
            groups.insert(&candidate.group);
        }
        if groups.len() > usize::from(MAX_GROUP_POINTER) {
            return Err(StrongboxError::Validation(format!(
                "a vault can hold at most {MAX_GROUP_POINTER} groups"
            )));
        }
        Ok(())
    }
}

/// `<file>.<YYYYMMDDhhmmss>.bak` beside the vault.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "vault".to_string());
    path.with_file_name(format!("{name}.{}.bak", now.format("%Y%m%d%H%M%S")))
}

/// Atomic write: temp file in the same directory, then rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, bytes)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}
