//! Integration tests for `game-studio synth`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use serde_json::Value;

use crate::{game_studio, project};

fn read_json(path: &std::path::Path) -> Value {
    let content = std::fs::read_to_string(path).expect("read");
    serde_json::from_str(&content).expect("json")
}

#[test]
fn test_synth_writes_template_and_manifest() {
    let dir = project();
    game_studio(dir.path())
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("Synthesized GameStudioStack"));

    let out = dir.path().join("cdk.out");
    let template = read_json(&out.join("GameStudioStack.template.json"));
    assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
    assert!(template["Resources"].as_object().is_some_and(|r| !r.is_empty()));

    let manifest = read_json(&out.join("manifest.json"));
    assert_eq!(
        manifest["artifacts"]["GameStudioStack"]["environment"],
        "aws://unknown-account/unknown-region"
    );
}

#[test]
fn test_synth_embeds_boot_script_after_shebang() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["synth", "--stdout"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let template: Value = serde_json::from_slice(&out.stdout).expect("json");
    let instance = template["Resources"]
        .as_object()
        .expect("resources")
        .values()
        .find(|r| r["Type"] == "AWS::EC2::Instance")
        .expect("instance");
    assert_eq!(
        instance["Properties"]["UserData"]["Fn::Base64"],
        "#!/bin/bash\necho configuring p4d\n"
    );
}

#[test]
fn test_synth_stdout_does_not_write_assembly() {
    let dir = project();
    game_studio(dir.path())
        .args(["synth", "--stdout"])
        .assert()
        .success();
    assert!(!dir.path().join("cdk.out").exists());
}

#[test]
fn test_synth_is_deterministic() {
    let dir = project();
    let first = game_studio(dir.path())
        .args(["synth", "--stdout"])
        .output()
        .expect("run");
    let second = game_studio(dir.path())
        .args(["synth", "--stdout"])
        .output()
        .expect("run");
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_synth_region_pins_image() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["synth", "--stdout", "--region", "us-east-1"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let template: Value = serde_json::from_slice(&out.stdout).expect("json");
    assert!(template.get("Mappings").is_none());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("ami-"), "image id missing");
}

#[test]
fn test_synth_unmapped_region_fails() {
    let dir = project();
    game_studio(dir.path())
        .args(["synth", "--region", "sa-east-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("sa-east-1"));
    assert!(!dir.path().join("cdk.out").exists());
}

#[test]
fn test_synth_out_flag_overrides_output_dir() {
    let dir = project();
    game_studio(dir.path())
        .args(["synth", "--out", "build/assembly"])
        .assert()
        .success();
    assert!(
        dir.path()
            .join("build/assembly/GameStudioStack.template.json")
            .exists()
    );
}

#[test]
fn test_synth_json_reports_digest() {
    let dir = project();
    let out = game_studio(dir.path())
        .args(["synth", "--json", "--account", "123456789012", "--region", "us-west-2"])
        .output()
        .expect("run");
    assert!(out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["stack"], "GameStudioStack");
    assert_eq!(v["sha256"].as_str().map(str::len), Some(64));

    let manifest = read_json(&dir.path().join("cdk.out/manifest.json"));
    assert_eq!(
        manifest["artifacts"]["GameStudioStack"]["environment"],
        "aws://123456789012/us-west-2"
    );
}

#[test]
fn test_synth_quiet_prints_nothing() {
    let dir = project();
    game_studio(dir.path())
        .args(["synth", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_synth_malformed_account_flag_fails() {
    let dir = project();
    game_studio(dir.path())
        .args(["synth", "--account", "abc", "--region", "us-east-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid value for stack.account: abc"));
    assert!(!dir.path().join("cdk.out").exists());
}

#[test]
fn test_synth_hand_edited_region_fails_with_json_code() {
    let dir = project();
    std::fs::write(
        dir.path().join("game-studio.yaml"),
        "stack:\n  region: moon-base\n",
    )
    .expect("write");
    let out = game_studio(dir.path())
        .args(["synth", "--json"])
        .output()
        .expect("run");
    assert_eq!(out.status.code(), Some(1));
    let v: Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(v["code"], "INVALID_CONFIG");
    assert!(!dir.path().join("cdk.out").exists());
}
