//! Properties of the synthesized Helix Core stack, checked through the
//! public library API.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeSet;

use serde_json::Value;

use game_studio::domain::compute::{MachineImage, UserData};
use game_studio::domain::construct::{Environment, Scope};
use game_studio::domain::stack::{DEFAULT_STACK_NAME, GameStudioStack, HELIX_CORE_AMIS};
use game_studio::domain::{StackChecks, StackError, Template};

fn synth(env: Environment) -> Template {
    let mut user_data = UserData::for_linux();
    user_data.add_commands("echo p4d");
    GameStudioStack::new(&Scope::new(env), DEFAULT_STACK_NAME, user_data)
        .expect("construct")
        .synth()
        .expect("synth")
}

fn regional(region: &str) -> Environment {
    Environment {
        account: None,
        region: Some(region.to_string()),
    }
}

fn only<'a>(t: &'a Template, kind: &str) -> &'a Value {
    let found: Vec<_> = t.resources_of_type(kind).collect();
    assert_eq!(found.len(), 1, "expected one {kind}");
    &found[0].1.properties
}

#[test]
fn test_single_availability_zone_without_nat() {
    let t = synth(Environment::agnostic());
    let zones: BTreeSet<String> = t
        .resources_of_type("AWS::EC2::Subnet")
        .map(|(_, r)| r.properties["AvailabilityZone"].to_string())
        .collect();
    assert_eq!(zones.len(), 1);
    assert_eq!(t.resources_of_type("AWS::EC2::NatGateway").count(), 0);
    assert_eq!(t.resources_of_type("AWS::EC2::EIP").count(), 0);
}

#[test]
fn test_one_public_ingress_rule_on_p4d_port() {
    let t = synth(Environment::agnostic());
    let rules = only(&t, "AWS::EC2::SecurityGroup")["SecurityGroupIngress"]
        .as_array()
        .expect("ingress");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["IpProtocol"], "tcp");
    assert_eq!(rules[0]["FromPort"], 1666);
    assert_eq!(rules[0]["ToPort"], 1666);
    assert_eq!(rules[0]["CidrIp"], "0.0.0.0/0");
}

#[test]
fn test_two_data_volumes() {
    let t = synth(Environment::agnostic());
    let devices = only(&t, "AWS::EC2::Instance")["BlockDeviceMappings"]
        .as_array()
        .expect("devices");
    let names: Vec<&str> = devices
        .iter()
        .filter_map(|d| d["DeviceName"].as_str())
        .collect();
    assert_eq!(names, ["/dev/sdb", "/dev/sdc"]);
    assert!(devices.iter().all(|d| d["Ebs"]["VolumeSize"] == 24));
}

#[test]
fn test_listener_and_target_share_port() {
    let t = synth(Environment::agnostic());
    let listener = only(&t, "AWS::ElasticLoadBalancingV2::Listener");
    let group = only(&t, "AWS::ElasticLoadBalancingV2::TargetGroup");
    assert_eq!(listener["Port"], 1666);
    assert_eq!(listener["Protocol"], "TCP");
    assert_eq!(group["Port"], 1666);
    assert_eq!(group["HealthCheckProtocol"], "TCP");
    assert_eq!(group["Targets"][0]["Port"], 1666);
}

#[test]
fn test_exactly_two_exported_outputs() {
    let t = synth(Environment::agnostic());
    let names: Vec<&str> = t.outputs.keys().map(String::as_str).collect();
    assert_eq!(names, ["InstanceID", "LoadBalancer"]);
    for (name, output) in &t.outputs {
        assert_eq!(output.export.as_ref().map(|e| e.name.as_str()), Some(name.as_str()));
    }
}

#[test]
fn test_unmapped_region_fails() {
    let err = GameStudioStack::new(
        &Scope::new(regional("ap-south-1")),
        DEFAULT_STACK_NAME,
        UserData::for_linux(),
    )
    .unwrap_err();
    assert!(matches!(err, StackError::MissingImageForRegion { ref region, .. } if region == "ap-south-1"));
}

#[test]
fn test_custom_image_table_missing_region_fails() {
    let image = MachineImage::generic_linux([("us-east-1", "ami-12345678")]);
    let result = GameStudioStack::with_image(
        &Scope::new(regional("us-west-2")),
        DEFAULT_STACK_NAME,
        UserData::for_linux(),
        &image,
    );
    assert!(matches!(result, Err(StackError::MissingImageForRegion { .. })));
}

#[test]
fn test_every_region_passes_checks() {
    for (region, ami) in HELIX_CORE_AMIS {
        let t = synth(regional(region));
        assert_eq!(only(&t, "AWS::EC2::Instance")["ImageId"], ami);
        let checks = StackChecks::run(&t);
        assert!(checks.all_passed(), "{region}: {:?}", checks.failures().collect::<Vec<_>>());
    }
}

#[test]
fn test_template_references_resolve() {
    synth(Environment::agnostic())
        .validate_references()
        .expect("no dangling references");
}
