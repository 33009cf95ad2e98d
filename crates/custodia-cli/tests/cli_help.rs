//! CLI surface smoke tests.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("custodia")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Console for the custodia admin backend"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("approvals"))
        .stdout(predicate::str::contains("claims"))
        .stdout(predicate::str::contains("contracts"))
        .stdout(predicate::str::contains("balance"));
}

#[test]
fn test_unknown_command_fails() {
    cargo_bin_cmd!("custodia")
        .arg("frobnicate")
        .assert()
        .failure();
}

#[test]
fn test_login_requires_email() {
    cargo_bin_cmd!("custodia")
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));
}
