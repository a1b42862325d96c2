//! Structural checks run against a synthesized template.
//!
//! This module is intentionally free of I/O. Checks read the rendered JSON,
//! not the construct tree, so they catch rendering mistakes as well as
//! wiring mistakes.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::domain::network::ANY_IPV4;
use crate::domain::stack::{
    DATA_DEVICES, DATA_VOLUME_GIB, OUTPUT_INSTANCE_ID, OUTPUT_LOAD_BALANCER, P4D_PORT,
};
use crate::domain::template::{Resource, Template};

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// All check results for one template.
#[derive(Debug, Clone, Serialize)]
pub struct StackChecks {
    pub results: Vec<CheckResult>,
}

impl StackChecks {
    #[must_use]
    pub fn run(template: &Template) -> Self {
        Self {
            results: vec![
                check_network(template),
                check_ingress(template),
                check_block_devices(template),
                check_port_consistency(template),
                check_outputs(template),
            ],
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

fn single<'a>(template: &'a Template, kind: &str) -> Result<&'a Resource, String> {
    let mut found = template.resources_of_type(kind).map(|(_, r)| r);
    match (found.next(), found.next()) {
        (Some(resource), None) => Ok(resource),
        (None, _) => Err(format!("no {kind} declared")),
        (Some(_), Some(_)) => Err(format!("more than one {kind} declared")),
    }
}

fn check_network(template: &Template) -> CheckResult {
    const NAME: &str = "network";
    let zones: BTreeSet<String> = template
        .resources_of_type("AWS::EC2::Subnet")
        .map(|(_, r)| r.properties["AvailabilityZone"].to_string())
        .collect();
    let nat_gateways = template.resources_of_type("AWS::EC2::NatGateway").count();

    if zones.len() == 1 && nat_gateways == 0 {
        CheckResult::pass(NAME, "1 availability zone, 0 NAT gateways")
    } else {
        CheckResult::fail(
            NAME,
            format!(
                "{} availability zones, {nat_gateways} NAT gateways (want 1 and 0)",
                zones.len()
            ),
        )
    }
}

fn check_ingress(template: &Template) -> CheckResult {
    const NAME: &str = "ingress";
    let group = match single(template, "AWS::EC2::SecurityGroup") {
        Ok(group) => group,
        Err(e) => return CheckResult::fail(NAME, e),
    };
    let rules = group.properties["SecurityGroupIngress"]
        .as_array()
        .map_or(&[][..], Vec::as_slice);
    let [rule] = rules else {
        return CheckResult::fail(NAME, format!("{} ingress rules (want 1)", rules.len()));
    };

    let ok = rule["IpProtocol"] == "tcp"
        && rule["FromPort"] == P4D_PORT
        && rule["ToPort"] == P4D_PORT
        && rule["CidrIp"] == ANY_IPV4;
    if ok {
        CheckResult::pass(NAME, format!("tcp/{P4D_PORT} from {ANY_IPV4}"))
    } else {
        CheckResult::fail(
            NAME,
            format!(
                "{}/{}-{} from {} (want tcp/{P4D_PORT} from {ANY_IPV4})",
                rule["IpProtocol"], rule["FromPort"], rule["ToPort"], rule["CidrIp"]
            ),
        )
    }
}

fn check_block_devices(template: &Template) -> CheckResult {
    const NAME: &str = "block-devices";
    let instance = match single(template, "AWS::EC2::Instance") {
        Ok(instance) => instance,
        Err(e) => return CheckResult::fail(NAME, e),
    };
    let mappings = instance.properties["BlockDeviceMappings"]
        .as_array()
        .map_or(&[][..], Vec::as_slice);

    let names: BTreeSet<&str> = mappings
        .iter()
        .filter_map(|m| m["DeviceName"].as_str())
        .collect();
    let sized = mappings
        .iter()
        .all(|m| m["Ebs"]["VolumeSize"] == DATA_VOLUME_GIB);
    let want: BTreeSet<&str> = DATA_DEVICES.into_iter().collect();

    if mappings.len() == DATA_DEVICES.len() && names == want && sized {
        CheckResult::pass(
            NAME,
            format!("{} x {DATA_VOLUME_GIB} GiB EBS", DATA_DEVICES.join(", ")),
        )
    } else {
        CheckResult::fail(
            NAME,
            format!(
                "{} devices {names:?} (want {} x {DATA_VOLUME_GIB} GiB EBS)",
                mappings.len(),
                DATA_DEVICES.join(", ")
            ),
        )
    }
}

fn check_port_consistency(template: &Template) -> CheckResult {
    const NAME: &str = "port-consistency";
    let (listener, group) = match (
        single(template, "AWS::ElasticLoadBalancingV2::Listener"),
        single(template, "AWS::ElasticLoadBalancingV2::TargetGroup"),
    ) {
        (Ok(l), Ok(g)) => (l, g),
        (Err(e), _) | (_, Err(e)) => return CheckResult::fail(NAME, e),
    };

    let target_ports: Vec<&Value> = group.properties["Targets"]
        .as_array()
        .map(|targets| targets.iter().map(|t| &t["Port"]).collect())
        .unwrap_or_default();

    let ok = listener.properties["Port"] == P4D_PORT
        && group.properties["Port"] == P4D_PORT
        && group.properties["HealthCheckProtocol"] == "TCP"
        && !target_ports.is_empty()
        && target_ports.iter().all(|p| **p == P4D_PORT);
    if ok {
        CheckResult::pass(
            NAME,
            format!("listener, target group and targets on {P4D_PORT}, TCP health check"),
        )
    } else {
        CheckResult::fail(
            NAME,
            format!(
                "listener {} target group {} targets {target_ports:?} health check {} (want {P4D_PORT} and TCP)",
                listener.properties["Port"],
                group.properties["Port"],
                group.properties["HealthCheckProtocol"]
            ),
        )
    }
}

fn check_outputs(template: &Template) -> CheckResult {
    const NAME: &str = "outputs";
    let names: BTreeSet<&str> = template.outputs.keys().map(String::as_str).collect();
    let want: BTreeSet<&str> = [OUTPUT_LOAD_BALANCER, OUTPUT_INSTANCE_ID].into_iter().collect();
    if names != want {
        return CheckResult::fail(NAME, format!("outputs {names:?} (want {want:?})"));
    }

    let unresolvable = template.outputs.iter().find(|(name, output)| {
        let exported = output.export.as_ref().is_some_and(|e| e.name == **name);
        let value = output.value.to_value();
        let empty = match &value {
            Value::String(s) => s.is_empty(),
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        !exported || empty
    });
    match unresolvable {
        Some((name, _)) => CheckResult::fail(NAME, format!("{name} is empty or not exported")),
        None => CheckResult::pass(NAME, format!("{OUTPUT_LOAD_BALANCER}, {OUTPUT_INSTANCE_ID} exported")),
    }
}
