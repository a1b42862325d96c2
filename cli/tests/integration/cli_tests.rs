//! Integration tests for the CLI skeleton: help, version, global flags.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::{game_studio, project};

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    let dir = project();
    game_studio(dir.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Synthesize the Helix Core server stack for AWS",
        ));
}

#[test]
fn test_cli_help_lists_commands() {
    let dir = project();
    game_studio(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("outputs"))
        .stdout(predicate::str::contains("resources"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command_shows_version() {
    let dir = project();
    game_studio(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "game-studio {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_no_color_accepts_conventional_values() {
    let dir = project();
    for value in ["1", "true", "yes", "0", ""] {
        game_studio(dir.path())
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success();
    }
}

#[test]
fn test_unknown_command_fails() {
    let dir = project();
    game_studio(dir.path()).arg("deploy").assert().failure();
}

// --- Error reporting ---

#[test]
fn test_missing_boot_script_reports_error() {
    let dir = project();
    std::fs::remove_file(dir.path().join("p4d-files/configure-p4d.sh")).expect("rm");
    game_studio(dir.path())
        .arg("synth")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Boot script not found"));
}

#[test]
fn test_json_error_object_on_stdout() {
    let dir = project();
    std::fs::remove_file(dir.path().join("p4d-files/configure-p4d.sh")).expect("rm");
    let out = game_studio(dir.path())
        .args(["synth", "--json"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["error"], true);
    assert_eq!(v["code"], "BOOT_SCRIPT_NOT_FOUND");
}

#[test]
fn test_logs_go_to_stderr_not_stdout() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["synth", "--stdout"])
        .env("RUST_LOG", "debug")
        .output()
        .expect("run");
    assert!(out.status.success());
    serde_json::from_slice::<serde_json::Value>(&out.stdout).expect("stdout is pure JSON");
    assert!(String::from_utf8_lossy(&out.stderr).contains("template synthesized"));
}
