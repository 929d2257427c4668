//! Integration tests for the VaultStore lifecycle.

use std::fs;
use std::path::{Path, PathBuf};

use strongbox::crypto::envelope::LEGACY_AES_GCM;
use strongbox::crypto::{
    generate_keyfile, generate_salt, seal_vault, Cipher, Credentials, NonceCounter,
    MIN_ITERATIONS,
};
use strongbox::errors::StrongboxError;
use strongbox::vault::{encode_payload, Entry, EntryField, NewEntry, VaultOptions, VaultStore};
use tempfile::TempDir;

const PASSPHRASE: &[u8] = b"correct horse battery";

/// Helper: a temp dir and a vault path inside it.
fn vault_path() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("test.sbx");
    (tmp, path)
}

/// Pinned at the floor so tests skip calibration.
fn options() -> VaultOptions {
    VaultOptions {
        iterations: Some(MIN_ITERATIONS),
        ..VaultOptions::default()
    }
}

fn new_entry(name: &str, group: &str) -> NewEntry {
    let mut e = NewEntry::default();
    e.name = name.into();
    e.group = group.into();
    e.username = format!("{name}-user");
    e.password = format!("{name}-pw");
    e
}

fn labels(store: &VaultStore) -> Vec<String> {
    store.list_entries().iter().map(|l| l.label()).collect()
}

fn backups_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "bak"))
        .collect()
}

// ---------------------------------------------------------------------------
// Create / open
// ---------------------------------------------------------------------------

#[test]
fn create_then_open_roundtrip() {
    let (_tmp, path) = vault_path();

    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.iterations(), MIN_ITERATIONS);
    store.add_entry(new_entry("mail", "work")).unwrap();
    store.add_entry(new_entry("bank", "")).unwrap();
    store.save().unwrap();

    let reopened = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.iterations(), MIN_ITERATIONS);
    assert_eq!(reopened.opened_with(), Some("aes-256-gcm/v2"));
    assert_eq!(reopened.format_version(), 2);
    assert_eq!(labels(&reopened), vec!["bank", "work/mail"]);

    let mail = reopened.entry(1).unwrap();
    assert_eq!(mail.username, "mail-user");
    assert_eq!(mail.password, "mail-pw");
    assert_eq!(mail.created, mail.modified);
}

#[test]
fn create_refuses_existing_file() {
    let (_tmp, path) = vault_path();
    VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    assert!(matches!(
        VaultStore::create(&path, PASSPHRASE, None, &options()),
        Err(StrongboxError::VaultAlreadyExists(_))
    ));
}

#[test]
fn open_missing_file_is_not_found() {
    let (_tmp, path) = vault_path();
    assert!(matches!(
        VaultStore::open(&path, PASSPHRASE, None, &options()),
        Err(StrongboxError::VaultNotFound(_))
    ));
}

#[test]
fn wrong_passphrase_fails_authentication() {
    let (_tmp, path) = vault_path();
    VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    assert!(matches!(
        VaultStore::open(&path, b"not the passphrase", None, &options()),
        Err(StrongboxError::AuthenticationFailed)
    ));
}

#[test]
fn short_file_is_invalid() {
    let (_tmp, path) = vault_path();
    fs::write(&path, [0u8; 10]).unwrap();

    assert!(matches!(
        VaultStore::open(&path, PASSPHRASE, None, &options()),
        Err(StrongboxError::InvalidVaultFile(_))
    ));
}

#[test]
fn tampered_file_fails_authentication() {
    let (_tmp, path) = vault_path();
    VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    let mut data = fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    fs::write(&path, &data).unwrap();

    assert!(matches!(
        VaultStore::open(&path, PASSPHRASE, None, &options()),
        Err(StrongboxError::AuthenticationFailed)
    ));
}

#[cfg(unix)]
#[test]
fn vault_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_tmp, path) = vault_path();
    VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

// ---------------------------------------------------------------------------
// Entry operations
// ---------------------------------------------------------------------------

#[test]
fn add_edit_delete_persist() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    store.add_entry(new_entry("forum", "home")).unwrap();
    let index = store.add_entry(new_entry("router", "home")).unwrap();
    assert_eq!(index, 1);

    let index = store.edit_entry(index, EntryField::Group, "net").unwrap();
    assert_eq!(store.entry(index).unwrap().label(), "net/router");
    store.edit_entry(index, EntryField::Password, "new-secret").unwrap();
    store.save().unwrap();

    let mut store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(labels(&store), vec!["home/forum", "net/router"]);
    assert_eq!(store.entry(1).unwrap().password, "new-secret");

    let removed = store.delete_entry(0).unwrap();
    assert_eq!(removed.label(), "home/forum");
    store.save().unwrap();

    let store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(labels(&store), vec!["net/router"]);
}

#[test]
fn duplicate_label_is_rejected_case_insensitively() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    store.add_entry(new_entry("Mail", "Work")).unwrap();
    assert!(matches!(
        store.add_entry(new_entry("mail", "work")),
        Err(StrongboxError::Validation(_))
    ));

    // Same name in another group is fine.
    store.add_entry(new_entry("mail", "home")).unwrap();
    assert_eq!(store.len(), 2);
}

#[test]
fn edit_into_collision_is_rejected() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    store.add_entry(new_entry("a", "")).unwrap();
    store.add_entry(new_entry("b", "")).unwrap();

    assert!(matches!(
        store.edit_entry(1, EntryField::Name, "A"),
        Err(StrongboxError::Validation(_))
    ));
    assert_eq!(labels(&store), vec!["a", "b"]);
}

#[test]
fn invalid_fields_are_rejected() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    assert!(store.add_entry(new_entry("", "")).is_err());
    assert!(store.add_entry(new_entry("a/b", "")).is_err());
    assert!(store.add_entry(new_entry("ok", "/lead")).is_err());

    let mut long = new_entry("long", "");
    long.email = "e".repeat(256);
    assert!(store.add_entry(long).is_err());

    assert!(store.is_empty());
}

#[test]
fn bad_index_is_entry_not_found() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    store.add_entry(new_entry("only", "")).unwrap();

    assert!(matches!(store.entry(1), Err(StrongboxError::EntryNotFound(1))));
    assert!(matches!(
        store.delete_entry(5),
        Err(StrongboxError::EntryNotFound(5))
    ));
    assert!(matches!(
        store.edit_entry(2, EntryField::Url, "x"),
        Err(StrongboxError::EntryNotFound(2))
    ));
}

#[test]
fn display_order_maps_to_storage() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    store.add_entry(new_entry("bank", "finance")).unwrap();
    store.add_entry(new_entry("bank", "")).unwrap();

    let listed = store.list_entries();
    assert_eq!(listed[0].label(), "bank");
    assert_eq!(listed[0].storage_index, 1);
    assert_eq!(listed[1].label(), "finance/bank");
    assert_eq!(listed[1].storage_index, 0);

    // Deleting display #0 removes the ungrouped entry.
    let removed = store.delete_entry(0).unwrap();
    assert_eq!(removed.group, "");
    assert_eq!(store.entries()[0].label(), "finance/bank");
}

// ---------------------------------------------------------------------------
// Passphrase and keyfile
// ---------------------------------------------------------------------------

#[test]
fn change_passphrase_rekeys_vault() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    store.add_entry(new_entry("mail", "")).unwrap();
    store.save().unwrap();

    assert!(matches!(
        store.change_passphrase(b"wrong guess", None, b"new passphrase", None),
        Err(StrongboxError::IncorrectPassphrase)
    ));

    store
        .change_passphrase(PASSPHRASE, None, b"new passphrase", None)
        .unwrap();

    assert!(matches!(
        VaultStore::open(&path, PASSPHRASE, None, &options()),
        Err(StrongboxError::AuthenticationFailed)
    ));
    let reopened = VaultStore::open(&path, b"new passphrase", None, &options()).unwrap();
    assert_eq!(labels(&reopened), vec!["mail"]);
}

#[test]
fn failed_passphrase_change_keeps_old_credentials() {
    let (tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    store.add_entry(new_entry("mail", "")).unwrap();
    store.save().unwrap();

    // A directory where the temp file goes makes the write fail.
    let blocker = tmp.path().join(".test.sbx.tmp");
    fs::create_dir(&blocker).unwrap();
    assert!(matches!(
        store.change_passphrase(PASSPHRASE, None, b"new passphrase", None),
        Err(StrongboxError::Io(_))
    ));
    fs::remove_dir(&blocker).unwrap();

    // The next save must still use the old passphrase.
    store.add_entry(new_entry("bank", "")).unwrap();
    store.save().unwrap();

    assert!(matches!(
        VaultStore::open(&path, b"new passphrase", None, &options()),
        Err(StrongboxError::AuthenticationFailed)
    ));
    let reopened = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(labels(&reopened), vec!["bank", "mail"]);
}

#[test]
fn keyfile_becomes_required() {
    let (tmp, path) = vault_path();
    let key_bytes = generate_keyfile(&tmp.path().join("vault.key")).unwrap();
    let keyfile = Some(key_bytes.as_slice());

    let mut store = VaultStore::create(&path, PASSPHRASE, keyfile, &options()).unwrap();
    assert!(store.has_keyfile());
    store.add_entry(new_entry("mail", "")).unwrap();
    store.save().unwrap();

    assert!(matches!(
        VaultStore::open(&path, PASSPHRASE, None, &options()),
        Err(StrongboxError::AuthenticationFailed)
    ));
    let mut store = VaultStore::open(&path, PASSPHRASE, keyfile, &options()).unwrap();
    assert_eq!(store.len(), 1);

    // Dropping the keyfile requires proving the old one.
    assert!(matches!(
        store.change_passphrase(PASSPHRASE, None, PASSPHRASE, None),
        Err(StrongboxError::IncorrectPassphrase)
    ));
    store
        .change_passphrase(PASSPHRASE, keyfile, PASSPHRASE, None)
        .unwrap();
    assert!(VaultStore::open(&path, PASSPHRASE, None, &options()).is_ok());
}

// ---------------------------------------------------------------------------
// Ciphers, nonces and legacy files
// ---------------------------------------------------------------------------

#[test]
fn chacha_vault_keeps_its_cipher() {
    let (_tmp, path) = vault_path();
    let chacha = VaultOptions {
        cipher: Some(Cipher::ChaCha20Poly1305),
        ..options()
    };
    VaultStore::create(&path, PASSPHRASE, None, &chacha).unwrap();

    // Opening without a cipher preference keeps the file's cipher.
    let mut store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(store.opened_with(), Some("chacha20-poly1305/v2"));
    assert_eq!(store.cipher(), Cipher::ChaCha20Poly1305);
    store.save().unwrap();

    let store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(store.opened_with(), Some("chacha20-poly1305/v2"));
}

#[test]
fn nonce_counter_increases_across_saves() {
    let (_tmp, path) = vault_path();
    let mut store = VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();
    let first = store.nonce_counter();
    store.save().unwrap();
    store.save().unwrap();
    assert_eq!(store.nonce_counter(), first + 2);

    let mut reopened = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(reopened.nonce_counter(), first + 2);
    reopened.save().unwrap();
    assert_eq!(reopened.nonce_counter(), first + 3);
}

#[test]
fn legacy_vault_is_upgraded_on_save() {
    let (_tmp, path) = vault_path();

    let mut old = Entry::default();
    old.name = "old".into();
    old.group = "legacy".into();
    old.password = "pw".into();
    old.created = 1_600_000_000;
    old.modified = 1_600_000_000;
    let entries = vec![old];

    let creds = Credentials::new(PASSPHRASE, None);
    let mut counter = NonceCounter::new(41);
    let file = seal_vault(
        &LEGACY_AES_GCM,
        &creds,
        MIN_ITERATIONS,
        &generate_salt(),
        &mut counter,
        &encode_payload(&entries).unwrap(),
    )
    .unwrap();
    fs::write(&path, file).unwrap();

    let mut store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(store.opened_with(), Some("aes-256-gcm/legacy"));
    assert_eq!(store.entries(), entries.as_slice());
    assert_eq!(store.nonce_counter(), 42);
    store.save().unwrap();

    let store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    assert_eq!(store.opened_with(), Some("aes-256-gcm/v2"));
    assert_eq!(store.entries(), entries.as_slice());
    assert_eq!(store.nonce_counter(), 43);
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

#[test]
fn backup_written_once_per_session() {
    let (tmp, path) = vault_path();
    let with_backups = VaultOptions {
        make_backups: true,
        ..options()
    };

    VaultStore::create(&path, PASSPHRASE, None, &with_backups).unwrap();
    assert!(backups_in(tmp.path()).is_empty());
    let original = fs::read(&path).unwrap();

    let mut store = VaultStore::open(&path, PASSPHRASE, None, &with_backups).unwrap();
    store.add_entry(new_entry("one", "")).unwrap();
    store.save().unwrap();
    store.add_entry(new_entry("two", "")).unwrap();
    store.save().unwrap();

    let backups = backups_in(tmp.path());
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read(&backups[0]).unwrap(), original);
}

#[test]
fn no_backup_when_disabled() {
    let (tmp, path) = vault_path();
    VaultStore::create(&path, PASSPHRASE, None, &options()).unwrap();

    let mut store = VaultStore::open(&path, PASSPHRASE, None, &options()).unwrap();
    store.add_entry(new_entry("one", "")).unwrap();
    store.save().unwrap();

    assert!(backups_in(tmp.path()).is_empty());
}
