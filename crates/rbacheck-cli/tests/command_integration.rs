//! Integration tests for CLI commands.
//!
//! `run` is exercised against a shell script standing in for kubectl.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DEFINITIONS: &str = r#"
cluster:
  ro:
    - command: get pods
      expected: "yes"
    - command: get certificates
      expected: "yes"
      api-resource-exists: certificates
"#;

const EXPECTATIONS: &str = r"
config:
  kind:
    serviceaccount:
      sa-a:
        cluster: ro
";

fn project(expectations: &str, definitions: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("rbac.yaml"), expectations).unwrap();
    fs::write(temp.path().join("definitions.yaml"), definitions).unwrap();
    temp
}

fn rbacheck(project: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rbacheck").unwrap();
    cmd.current_dir(project).arg("--no-color");
    cmd
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_loads_valid_inputs() {
    let temp = project(EXPECTATIONS, DEFINITIONS);

    rbacheck(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 1 identities"))
        .stdout(predicate::str::contains("Loaded 2 probe templates"))
        .stdout(predicate::str::contains("Every referenced label has definitions"));
}

#[test]
fn check_warns_about_uncovered_labels() {
    let temp = project(
        "config:\n  kind:\n    group:\n      devs:\n        cluster: missing\n",
        DEFINITIONS,
    );

    rbacheck(temp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No definitions for cluster/missing"));
}

#[test]
fn check_rejects_malformed_expectations() {
    let temp = project("config: [unclosed", DEFINITIONS);

    rbacheck(temp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load expectations"));
}

#[test]
fn check_rejects_unknown_identity_kind() {
    let temp = project(
        "config:\n  kind:\n    user:\n      alice:\n        cluster: ro\n",
        DEFINITIONS,
    );

    rbacheck(temp.path()).arg("check").assert().failure();
}

#[test]
fn check_honours_path_overrides() {
    let temp = project(EXPECTATIONS, DEFINITIONS);
    fs::rename(
        temp.path().join("definitions.yaml"),
        temp.path().join("library.yaml"),
    )
    .unwrap();

    rbacheck(temp.path())
        .args(["check", "--definitions", "library.yaml"])
        .assert()
        .success();
}

// ============================================================================
// run
// ============================================================================

#[test]
fn run_aborts_on_malformed_definitions_before_probing() {
    let temp = project(EXPECTATIONS, "cluster:\n  ro:\n    - command: get pods\n      expected: maybe\n");

    rbacheck(temp.path())
        .args(["run", "--kubectl", "/nonexistent/kubectl"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load definitions"));
}

#[test]
fn run_fails_when_kubectl_is_missing() {
    let temp = project(EXPECTATIONS, DEFINITIONS);

    rbacheck(temp.path())
        .args(["run", "--kubectl", "/nonexistent/kubectl"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to list API resources"));
}

#[cfg(unix)]
fn fake_kubectl(dir: &Path, answer: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-kubectl");
    let script = format!(
        r#"#!/bin/sh
case "$1" in
  api-resources) echo "pods  po  v1  true  Pod" ;;
  auth) echo "{answer}"; [ "{answer}" = "yes" ] || exit 1 ;;
  get)
    echo "$*" >> "$(dirname "$0")/calls.log"
    echo "Error from server (NotFound): $2 \"$3\" not found" >&2; exit 1 ;;
  create|delete) echo "$*" >> "$(dirname "$0")/calls.log"; echo "namespace/$3" ;;
  *) echo "unexpected: $*" >&2; exit 1 ;;
esac
"#
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn run_passes_when_cluster_matches() {
    let temp = project(EXPECTATIONS, DEFINITIONS);
    let kubectl = fake_kubectl(temp.path(), "yes");

    rbacheck(temp.path())
        .args(["run", "--kubectl"])
        .arg(&kubectl)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Checking sa-a..."))
        .stdout(predicate::str::contains("kubectl auth can-i --as=sa-a get pods"))
        .stdout(predicate::str::contains("Output:   Success"))
        .stdout(predicate::str::contains("No error has been found."))
        // certificates are not served by the fake cluster
        .stdout(predicate::str::contains("get certificates").not());
}

#[cfg(unix)]
#[test]
fn run_reports_discrepancies_and_exits_one() {
    let temp = project(EXPECTATIONS, DEFINITIONS);
    let kubectl = fake_kubectl(temp.path(), "no");

    rbacheck(temp.path())
        .args(["run", "--kubectl"])
        .arg(&kubectl)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Output:   Failure"))
        .stdout(predicate::str::contains("List of errors:"))
        .stdout(predicate::str::contains(
            "Expected yes, but returns no. kubectl auth can-i --as=sa-a get pods",
        ));
}

#[cfg(unix)]
#[test]
fn run_provisions_and_removes_wildcard_namespace() {
    let temp = project(
        "config:\n  kind:\n    group:\n      devs:\n        namespaces:\n          team-*: dev\n          payments: dev\n",
        "namespaces:\n  dev:\n    - command: create deployments\n      expected: \"yes\"\n",
    );
    fs::write(
        temp.path().join("rbacheck.toml"),
        "[provisioning]\npoll_attempts = 2\npoll_interval_secs = 0\n",
    )
    .unwrap();
    let kubectl = fake_kubectl(temp.path(), "yes");

    rbacheck(temp.path())
        .args(["run", "--kubectl"])
        .arg(&kubectl)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("create deployments -n team-"))
        .stdout(predicate::str::contains("Namespace payments does not exist and was skipped"));

    let calls = fs::read_to_string(temp.path().join("calls.log")).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert!(calls.contains(&"get namespace payments -o name"));
    assert!(calls.iter().any(|c| c.starts_with("create namespace team-")));
    assert_eq!(
        calls
            .iter()
            .filter(|c| c.starts_with("get rolebinding valstro:groups:dev-n:cluster-admin -n team-"))
            .count(),
        2
    );
    assert!(calls.last().unwrap().starts_with("delete namespace team-"));
}
