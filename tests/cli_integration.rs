//! Integration tests for the Strongbox CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passphrases come from `STRONGBOX_PASSPHRASE` and field values from
//! piped stdin, so nothing here needs a terminal.  Every test pins the
//! PBKDF2 cost through a config file to skip calibration.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PASSPHRASE: &str = "test passphrase";

/// Helper: get a Command pointing at the strongbox binary.
fn strongbox() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("strongbox").expect("binary should exist");
    cmd.env_remove("STRONGBOX_VAULT")
        .env_remove("STRONGBOX_CONFIG_DIR")
        .env_remove("STRONGBOX_NEW_PASSPHRASE")
        .env_remove("STRONGBOX_LOG");
    cmd
}

/// A temp dir holding a config that pins iterations, plus a vault path.
struct Sandbox {
    tmp: TempDir,
    vault: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("strongbox.toml"), "iterations = 100000\n").unwrap();
        let vault = tmp.path().join("cli.sbx");
        Self { tmp, vault }
    }

    fn dir(&self) -> &Path {
        self.tmp.path()
    }

    /// A command already pointed at this sandbox's vault and config.
    fn cmd(&self, passphrase: &str) -> Command {
        let mut cmd = strongbox();
        cmd.arg("--vault")
            .arg(&self.vault)
            .arg("--config-dir")
            .arg(self.dir())
            .env("STRONGBOX_PASSPHRASE", passphrase);
        cmd
    }

    fn init(&self) {
        self.cmd(PASSPHRASE).arg("init").assert().success();
    }

    fn add(&self, args: &[&str], password: &str) {
        self.cmd(PASSPHRASE)
            .arg("add")
            .args(args)
            .write_stdin(format!("{password}\n"))
            .assert()
            .success();
    }
}

// ---------------------------------------------------------------------------
// Commands that need no vault
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    strongbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted password vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("passphrase"))
        .stdout(predicate::str::contains("keyfile"));
}

#[test]
fn version_flag_shows_version() {
    strongbox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("strongbox"));
}

#[test]
fn no_args_shows_help() {
    strongbox()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn generate_prints_password_of_requested_length() {
    let output = strongbox()
        .args(["generate", "--length", "12"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let password = String::from_utf8(output).unwrap();
    assert_eq!(password.trim_end_matches('\n').chars().count(), 12);
}

#[test]
fn generate_digits_only() {
    let output = strongbox()
        .args([
            "generate",
            "-l",
            "30",
            "--no-uppercase",
            "--no-lowercase",
            "--no-punctuation",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let password = String::from_utf8(output).unwrap();
    let password = password.trim_end_matches('\n');
    assert_eq!(password.len(), 30);
    assert!(password.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn generate_rejects_short_length() {
    strongbox()
        .args(["generate", "--length", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 4"));
}

#[test]
fn keyfile_command_writes_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("vault.key");

    strongbox()
        .arg("keyfile")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Keyfile written"));
    assert_eq!(fs::read(&path).unwrap().len(), 64);

    // A second run must not overwrite it.
    strongbox().arg("keyfile").arg(&path).assert().failure();
}

// ---------------------------------------------------------------------------
// Vault lifecycle
// ---------------------------------------------------------------------------

#[test]
fn list_on_missing_vault_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(PASSPHRASE)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

#[test]
fn init_creates_vault_once() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(PASSPHRASE)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("100000 PBKDF2 iterations"));
    assert!(sandbox.vault.exists());

    sandbox
        .cmd(PASSPHRASE)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_passphrase() {
    let sandbox = Sandbox::new();
    sandbox.cmd("short").arg("init").assert().failure();
    assert!(!sandbox.vault.exists());
}

#[test]
fn add_list_show_roundtrip() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add(&["mail", "-g", "work", "-u", "alice"], "s3cret-mail");
    sandbox.add(&["bank"], "s3cret-bank");

    sandbox
        .cmd(PASSPHRASE)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("bank"))
        .stdout(predicate::str::contains("work/mail"))
        .stdout(predicate::str::contains("alice"));

    // "bank" sorts first, so "work/mail" is entry 2.
    sandbox
        .cmd(PASSPHRASE)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("s3cret-mail").not());

    sandbox
        .cmd(PASSPHRASE)
        .args(["show", "2", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cret-mail"));
}

#[test]
fn group_segments_escape_slashes() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add(&["wiki", "-g", "sites", "-g", "a/b testing"], "pw");

    sandbox
        .cmd(PASSPHRASE)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sites/a\\b testing/wiki"));

    sandbox
        .cmd(PASSPHRASE)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sites > a/b testing"));
}

#[test]
fn add_duplicate_fails() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add(&["mail"], "pw");

    sandbox
        .cmd(PASSPHRASE)
        .args(["add", "MAIL"])
        .write_stdin("pw\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn edit_and_delete_entry() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add(&["mail"], "old-password");

    sandbox
        .cmd(PASSPHRASE)
        .args(["edit", "1", "password"])
        .write_stdin("new-password\n")
        .assert()
        .success();

    sandbox
        .cmd(PASSPHRASE)
        .args(["show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new-password"));

    sandbox
        .cmd(PASSPHRASE)
        .args(["edit", "1", "colour", "blue"])
        .assert()
        .failure();

    sandbox
        .cmd(PASSPHRASE)
        .args(["delete", "1", "--force"])
        .assert()
        .success();

    sandbox
        .cmd(PASSPHRASE)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No entries"));
}

#[test]
fn unknown_entry_number_fails() {
    let sandbox = Sandbox::new();
    sandbox.init();

    sandbox
        .cmd(PASSPHRASE)
        .args(["show", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry 3 not found"));
}

#[test]
fn wrong_passphrase_fails() {
    let sandbox = Sandbox::new();
    sandbox.init();

    sandbox
        .cmd("wrong passphrase")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Incorrect passphrase"));
}

#[test]
fn passphrase_change_takes_effect() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.add(&["mail"], "pw");

    sandbox
        .cmd(PASSPHRASE)
        .env("STRONGBOX_NEW_PASSPHRASE", "a different passphrase")
        .arg("passphrase")
        .assert()
        .success();

    sandbox.cmd(PASSPHRASE).arg("list").assert().failure();
    sandbox
        .cmd("a different passphrase")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("mail"));
}

#[test]
fn keyfile_protected_vault() {
    let sandbox = Sandbox::new();
    let keyfile = sandbox.dir().join("vault.key");
    strongbox().arg("keyfile").arg(&keyfile).assert().success();

    sandbox
        .cmd(PASSPHRASE)
        .arg("--keyfile")
        .arg(&keyfile)
        .arg("init")
        .assert()
        .success();

    sandbox.cmd(PASSPHRASE).arg("list").assert().failure();
    sandbox
        .cmd(PASSPHRASE)
        .arg("--keyfile")
        .arg(&keyfile)
        .arg("list")
        .assert()
        .success();
}
