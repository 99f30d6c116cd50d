//! Focused CLI argument parsing tests.
//!
//! Tests that verify command-line argument parsing works correctly without
//! requiring a cluster.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Commands That Work Without a Cluster
// ============================================================================

#[test]
fn version_command_succeeds() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rbacheck"));
}

#[test]
fn version_flag_shows_version() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rbacheck"));
}

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("RBAC"));
}

#[test]
fn run_help_lists_overrides() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--expectations"))
        .stdout(predicate::str::contains("--definitions"))
        .stdout(predicate::str::contains("--context"))
        .stdout(predicate::str::contains("--kubectl"));
}

#[test]
fn config_show_defaults_as_json() {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("rbacheck")
        .unwrap()
        .args(["config", "show", "--format", "json", "--project"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"poll_attempts\": 20"))
        .stdout(predicate::str::contains("valstro:groups:dev-n:cluster-admin"));
}

// ============================================================================
// Argument Parsing Errors
// ============================================================================

#[test]
fn no_command_shows_help() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .arg("audit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn config_requires_subcommand() {
    Command::cargo_bin("rbacheck")
        .unwrap()
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
