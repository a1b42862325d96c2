//! Integration tests for `game-studio config` command.
//!
//! Every test runs in its own temp project so the default
//! `./game-studio.yaml` is never shared.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;

use crate::{game_studio, project};

// ---------------------------------------------------------------------------
// Subcommand registration
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_show_and_set_subcommands() {
    let dir = project();
    game_studio(dir.path())
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"));
}

// ---------------------------------------------------------------------------
// `game-studio config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_show_no_config_file_uses_defaults() {
    let dir = project();
    game_studio(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GameStudioStack"))
        .stdout(predicate::str::contains("cdk.out"))
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let dir = project();
    game_studio(dir.path()).args(["config", "show"]).assert().success();
    assert!(!dir.path().join("game-studio.yaml").exists());
}

#[test]
fn test_config_show_json() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["config", "show", "--json"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["path"], "game-studio.yaml");
    assert_eq!(v["config"]["stack"]["name"], "GameStudioStack");
    assert!(v["config"]["stack"]["region"].is_null());
}

// ---------------------------------------------------------------------------
// `game-studio config set`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_region_persists() {
    let dir = project();
    game_studio(dir.path())
        .args(["config", "set", "stack.region", "us-west-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set stack.region = us-west-1"));

    let content = std::fs::read_to_string(dir.path().join("game-studio.yaml")).expect("read");
    assert!(content.contains("region: us-west-1"), "got: {content}");
}

#[test]
fn test_config_set_region_then_synth_uses_it() {
    let dir = project();
    game_studio(dir.path())
        .args(["config", "set", "stack.region", "us-west-1"])
        .assert()
        .success();
    game_studio(dir.path()).arg("synth").assert().success();

    let manifest = std::fs::read_to_string(dir.path().join("cdk.out/manifest.json")).expect("read");
    assert!(manifest.contains("aws://unknown-account/us-west-1"), "got: {manifest}");
}

#[test]
fn test_config_set_none_clears_region() {
    let dir = project();
    game_studio(dir.path())
        .args(["config", "set", "stack.region", "us-west-1"])
        .assert()
        .success();
    game_studio(dir.path())
        .args(["config", "set", "stack.region", "none"])
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.path().join("game-studio.yaml")).expect("read");
    assert!(content.contains("region: null"), "got: {content}");
}

#[test]
fn test_config_set_unknown_key_fails() {
    let dir = project();
    game_studio(dir.path())
        .args(["config", "set", "security.level", "strict"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown setting"))
        .stderr(predicate::str::contains("stack.region"));
    assert!(!dir.path().join("game-studio.yaml").exists());
}

#[test]
fn test_config_set_invalid_account_fails_with_json_code() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["--json", "config", "set", "stack.account", "42"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["code"], "INVALID_CONFIG");
}

#[test]
fn test_config_flag_selects_file() {
    let dir = project();
    game_studio(dir.path())
        .args(["--config", "conf/studio.yaml", "config", "set", "stack.name", "Studio"])
        .assert()
        .success();
    assert!(dir.path().join("conf/studio.yaml").exists());

    game_studio(dir.path())
        .args(["synth", "--stdout"])
        .env("GAME_STUDIO_CONFIG", "conf/studio.yaml")
        .assert()
        .success();
    game_studio(dir.path())
        .args(["synth"])
        .env("GAME_STUDIO_CONFIG", "conf/studio.yaml")
        .assert()
        .success();
    assert!(dir.path().join("cdk.out/Studio.template.json").exists());
}

#[test]
fn test_malformed_config_reports_path() {
    let dir = project();
    std::fs::write(dir.path().join("game-studio.yaml"), "stack: [").expect("write");
    game_studio(dir.path())
        .arg("synth")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("game-studio.yaml"));
}
