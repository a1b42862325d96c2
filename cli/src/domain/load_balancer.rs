//! Network load balancer, listeners and instance target groups.

use serde::Serialize;

use crate::domain::construct::ConstructPath;
use crate::domain::error::StackError;
use crate::domain::template::{Expr, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }
}

/// Target group health check. Unset fields keep the AWS defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthCheck {
    pub protocol: Option<Protocol>,
    pub port: Option<u16>,
}

/// Registers an EC2 instance with a target group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTarget {
    instance_id: Expr,
    port: Option<u16>,
}

impl InstanceTarget {
    /// Target `instance_id`, optionally on a port other than the group's.
    #[must_use]
    pub fn new(instance_id: Expr, port: Option<u16>) -> Self {
        Self { instance_id, port }
    }

    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

#[derive(Debug, Clone)]
pub struct TargetGroupProps {
    pub port: u16,
    pub protocol: Protocol,
    pub targets: Vec<InstanceTarget>,
    pub health_check: HealthCheck,
}

#[derive(Debug, Clone)]
pub struct TargetGroup {
    path: ConstructPath,
    props: TargetGroupProps,
}

impl TargetGroup {
    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    #[must_use]
    pub fn props(&self) -> &TargetGroupProps {
        &self.props
    }
}

#[derive(Debug, Clone)]
pub struct Listener {
    path: ConstructPath,
    port: u16,
    protocol: Protocol,
    target_groups: Vec<TargetGroup>,
}

impl Listener {
    /// Create a target group under this listener and forward to it.
    ///
    /// The group's construct ID is `id` + `Group`.
    pub fn add_targets(&mut self, id: &str, props: TargetGroupProps) -> &TargetGroup {
        self.target_groups.push(TargetGroup {
            path: self.path.child(&format!("{id}Group")),
            props,
        });
        let last = self.target_groups.len() - 1;
        &self.target_groups[last]
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[must_use]
    pub fn target_groups(&self) -> &[TargetGroup] {
        &self.target_groups
    }
}

pub struct ListenerProps {
    pub port: u16,
    /// Defaults to TCP.
    pub protocol: Option<Protocol>,
}

#[derive(Debug, Clone)]
pub struct NetworkLoadBalancerProps {
    pub vpc_id: Expr,
    pub internet_facing: bool,
    pub subnets: Vec<Expr>,
    /// Resources that must exist before the load balancer, e.g. the public
    /// subnets' internet routes.
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NetworkLoadBalancer {
    path: ConstructPath,
    props: NetworkLoadBalancerProps,
    listeners: Vec<Listener>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Attribute {
    key: &'static str,
    value: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnLoadBalancer {
    load_balancer_attributes: Vec<Attribute>,
    scheme: &'static str,
    subnets: Vec<Expr>,
    #[serde(rename = "Type")]
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Action {
    target_group_arn: Expr,
    #[serde(rename = "Type")]
    kind: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnListener {
    default_actions: Vec<Action>,
    load_balancer_arn: Expr,
    port: u16,
    protocol: Protocol,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnTarget {
    id: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnTargetGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    health_check_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    health_check_protocol: Option<Protocol>,
    port: u16,
    protocol: Protocol,
    target_type: &'static str,
    targets: Vec<CfnTarget>,
    vpc_id: Expr,
}

impl NetworkLoadBalancer {
    #[must_use]
    pub fn new(path: ConstructPath, props: NetworkLoadBalancerProps) -> Self {
        Self {
            path,
            props,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, id: &str, props: ListenerProps) -> &mut Listener {
        self.listeners.push(Listener {
            path: self.path.child(id),
            port: props.port,
            protocol: props.protocol.unwrap_or(Protocol::Tcp),
            target_groups: Vec::new(),
        });
        let last = self.listeners.len() - 1;
        &mut self.listeners[last]
    }

    #[must_use]
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    #[must_use]
    pub fn internet_facing(&self) -> bool {
        self.props.internet_facing
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    /// Public DNS name, known once deployed.
    #[must_use]
    pub fn dns_name(&self) -> Expr {
        Expr::get_att(self.logical_id(), "DNSName")
    }

    /// Render the load balancer with all listeners and target groups.
    ///
    /// # Errors
    ///
    /// Returns an error if a listener has no target group or a logical ID
    /// collides.
    pub fn render(&self, template: &mut Template) -> Result<(), StackError> {
        let id = self.logical_id();
        template.add_resource(
            &id,
            "AWS::ElasticLoadBalancingV2::LoadBalancer",
            &CfnLoadBalancer {
                load_balancer_attributes: vec![Attribute {
                    key: "deletion_protection.enabled",
                    value: "false",
                }],
                scheme: if self.props.internet_facing {
                    "internet-facing"
                } else {
                    "internal"
                },
                subnets: self.props.subnets.clone(),
                kind: "network",
            },
        )?;
        template.add_dependencies(&id, self.props.depends_on.iter().cloned());

        for listener in &self.listeners {
            self.render_listener(listener, template)?;
        }
        Ok(())
    }

    fn render_listener(&self, listener: &Listener, template: &mut Template) -> Result<(), StackError> {
        if listener.target_groups.is_empty() {
            return Err(StackError::ListenerWithoutTargets(listener.path.to_string()));
        }

        template.add_resource(
            &listener.logical_id(),
            "AWS::ElasticLoadBalancingV2::Listener",
            &CfnListener {
                default_actions: listener
                    .target_groups
                    .iter()
                    .map(|group| Action {
                        target_group_arn: Expr::reference(group.logical_id()),
                        kind: "forward",
                    })
                    .collect(),
                load_balancer_arn: Expr::reference(self.logical_id()),
                port: listener.port,
                protocol: listener.protocol,
            },
        )?;

        for group in &listener.target_groups {
            let props = &group.props;
            template.add_resource(
                &group.logical_id(),
                "AWS::ElasticLoadBalancingV2::TargetGroup",
                &CfnTargetGroup {
                    health_check_port: props.health_check.port.map(|p| p.to_string()),
                    health_check_protocol: props.health_check.protocol,
                    port: props.port,
                    protocol: props.protocol,
                    target_type: "instance",
                    targets: props
                        .targets
                        .iter()
                        .map(|t| CfnTarget {
                            id: t.instance_id.clone(),
                            port: t.port,
                        })
                        .collect(),
                    vpc_id: self.props.vpc_id.clone(),
                },
            )?;
        }
        Ok(())
    }
}
