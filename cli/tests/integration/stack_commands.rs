//! Integration tests for `check`, `outputs` and `resources`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use predicates::prelude::*;
use serde_json::Value;

use crate::{game_studio, project};

fn json_of(args: &[&str]) -> Value {
    let dir = project();
    let out = game_studio(dir.path()).args(args).output().expect("run");
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("json")
}

// --- check ---

#[test]
fn test_check_passes_for_default_stack() {
    let dir = project();
    game_studio(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ network"))
        .stdout(predicate::str::contains("✓ outputs"))
        .stdout(predicate::str::contains("✗").not());
}

#[test]
fn test_check_json_lists_all_results() {
    let v = json_of(&["check", "--json"]);
    assert_eq!(v["passed"], true);
    let names: Vec<&str> = v["results"]
        .as_array()
        .expect("results")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert_eq!(
        names,
        ["network", "ingress", "block-devices", "port-consistency", "outputs"]
    );
}

#[test]
fn test_check_region_passes() {
    let v = json_of(&["check", "--json", "--region", "us-east-2"]);
    assert_eq!(v["passed"], true);
}

// --- outputs ---

#[test]
fn test_outputs_lists_load_balancer_and_instance() {
    let dir = project();
    game_studio(dir.path())
        .arg("outputs")
        .assert()
        .success()
        .stdout(predicate::str::contains("LoadBalancer"))
        .stdout(predicate::str::contains("InstanceID"))
        .stdout(predicate::str::contains("DNSName"));
}

#[test]
fn test_outputs_json_exports() {
    let v = json_of(&["outputs", "--json"]);
    let outputs = v["outputs"].as_array().expect("outputs");
    assert_eq!(outputs.len(), 2);
    for o in outputs {
        assert_eq!(o["export"], o["name"]);
        assert!(!o["value"].is_null());
    }
}

// --- resources ---

#[test]
fn test_resources_lists_types() {
    let dir = project();
    game_studio(dir.path())
        .arg("resources")
        .assert()
        .success()
        .stdout(predicate::str::contains("AWS::EC2::VPC"))
        .stdout(predicate::str::contains("AWS::EC2::Instance"))
        .stdout(predicate::str::contains(
            "AWS::ElasticLoadBalancingV2::LoadBalancer",
        ))
        .stdout(predicate::str::contains("AWS::EC2::NatGateway").not());
}

#[test]
fn test_resources_json_has_single_instance() {
    let v = json_of(&["resources", "--json"]);
    let instances = v["resources"]
        .as_array()
        .expect("resources")
        .iter()
        .filter(|r| r["type"] == "AWS::EC2::Instance")
        .count();
    assert_eq!(instances, 1);
}
