//! Argument validation and exit codes of the `debfetch` binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

fn debfetch() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("debfetch"));
    cmd.env("NO_COLOR", "1")
        .env_remove("DEBFETCH_HOST")
        .env_remove("DEBFETCH_USER")
        .env_remove("RUST_LOG");
    cmd
}

/// Point the config lookup at an empty temp dir so a developer's own
/// config file never leaks into the test.
fn isolated(cmd: &mut Command, dir: &tempfile::TempDir) {
    cmd.env("DEBFETCH_CONFIG", dir.path().join("config.yaml"));
}

// --- Help and version tests ---

#[test]
fn test_no_args_shows_help_and_exits_two() {
    debfetch().assert().code(2).stderr(predicate::str::contains(
        "Fetch a Debian package and its dependencies",
    ));
}

#[test]
fn test_help_lists_every_flag() {
    debfetch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--host"))
        .stdout(predicate::str::contains("--method"))
        .stdout(predicate::str::contains("--skip"))
        .stdout(predicate::str::contains("--archive"));
}

#[test]
fn test_version_flag_shows_version() {
    debfetch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("debfetch"));
}

// --- Argument validation ---

#[test]
fn test_missing_host_exits_two() {
    debfetch()
        .args(["-u", "ops", "curl"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn test_unknown_method_exits_two() {
    debfetch()
        .args(["--host", "h", "-u", "ops", "--method", "apt", "curl"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("auto, uris, rdepends"));
}

#[test]
fn test_invalid_package_name_fails_before_connecting() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out");
    let mut cmd = debfetch();
    isolated(&mut cmd, &tmp);
    cmd.args(["--host", "203.0.113.1", "-u", "ops", "-o"])
        .arg(&out)
        .arg("--")
        .arg("-rf")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid input"));
    assert!(!out.exists(), "output dir must not be created for bad input");
}

#[test]
fn test_invalid_package_name_json_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut cmd = debfetch();
    isolated(&mut cmd, &tmp);
    cmd.args(["--host", "h", "-u", "ops", "--json", "bad name"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""code": "invalid_input""#))
        .stdout(predicate::str::contains(r#""error": true"#));
}

#[test]
#[serial]
fn test_broken_config_file_is_reported() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(tmp.path().join("config.yaml"), "port: 0\n").expect("write");
    let mut cmd = debfetch();
    isolated(&mut cmd, &tmp);
    cmd.args(["--host", "h", "-u", "ops", "curl"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("1-65535"));
}

#[test]
#[serial]
fn test_host_and_user_from_env() {
    // Same validation path as above, but host/user supplied by env vars.
    let tmp = tempfile::tempdir().expect("tempdir");
    let mut cmd = debfetch();
    isolated(&mut cmd, &tmp);
    cmd.env("DEBFETCH_HOST", "h")
        .env("DEBFETCH_USER", "ops")
        .arg("bad name")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid input"));
}
