//! Security groups: peers, ports and ingress/egress rule rendering.

use serde::Serialize;

use crate::domain::construct::ConstructPath;
use crate::domain::error::StackError;
use crate::domain::network::Ipv4Cidr;
use crate::domain::template::{Expr, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Tcp,
    Udp,
    All,
}

impl IpProtocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::All => "-1",
        }
    }
}

/// Protocol plus an inclusive port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    protocol: IpProtocol,
    range: Option<(u16, u16)>,
}

impl Port {
    #[must_use]
    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: IpProtocol::Tcp,
            range: Some((port, port)),
        }
    }

    #[must_use]
    pub fn udp(port: u16) -> Self {
        Self {
            protocol: IpProtocol::Udp,
            range: Some((port, port)),
        }
    }

    #[must_use]
    pub fn tcp_range(from: u16, to: u16) -> Self {
        Self {
            protocol: IpProtocol::Tcp,
            range: Some((from.min(to), from.max(to))),
        }
    }

    #[must_use]
    pub fn all_traffic() -> Self {
        Self {
            protocol: IpProtocol::All,
            range: None,
        }
    }

    #[must_use]
    pub fn protocol(&self) -> IpProtocol {
        self.protocol
    }

    #[must_use]
    pub fn range(&self) -> Option<(u16, u16)> {
        self.range
    }
}

/// Source (ingress) or destination (egress) of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peer(Ipv4Cidr);

impl Peer {
    #[must_use]
    pub fn ipv4(cidr: Ipv4Cidr) -> Self {
        Self(cidr)
    }

    #[must_use]
    pub fn any_ipv4() -> Self {
        Self(Ipv4Cidr::any())
    }

    #[must_use]
    pub fn cidr(&self) -> Ipv4Cidr {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub peer: Peer,
    pub port: Port,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct SecurityGroupProps {
    pub description: String,
    pub name: Option<String>,
    pub allow_all_outbound: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityGroup {
    path: ConstructPath,
    props: SecurityGroupProps,
    vpc_id: Expr,
    ingress: Vec<Rule>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnRule {
    cidr_ip: Ipv4Cidr,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_port: Option<u16>,
    ip_protocol: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_port: Option<u16>,
}

impl From<&Rule> for CfnRule {
    fn from(rule: &Rule) -> Self {
        Self {
            cidr_ip: rule.peer.cidr(),
            description: rule.description.clone(),
            from_port: rule.port.range().map(|(from, _)| from),
            ip_protocol: rule.port.protocol().as_str(),
            to_port: rule.port.range().map(|(_, to)| to),
        }
    }
}

/// Rule rendered when outbound traffic is locked down, since an empty egress
/// list would let CloudFormation fall back to allowing everything.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnDenyAllEgress {
    cidr_ip: &'static str,
    description: &'static str,
    from_port: u16,
    ip_protocol: &'static str,
    to_port: u16,
}

const DENY_ALL_EGRESS: CfnDenyAllEgress = CfnDenyAllEgress {
    cidr_ip: "255.255.255.255/32",
    description: "Disallow all traffic",
    from_port: 252,
    ip_protocol: "icmp",
    to_port: 86,
};

#[derive(Serialize)]
#[serde(untagged)]
enum CfnEgress {
    Rules(Vec<CfnRule>),
    DenyAll([CfnDenyAllEgress; 1]),
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnSecurityGroup {
    group_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_name: Option<String>,
    security_group_egress: CfnEgress,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    security_group_ingress: Vec<CfnRule>,
    vpc_id: Expr,
}

impl SecurityGroup {
    #[must_use]
    pub fn new(path: ConstructPath, vpc_id: Expr, props: SecurityGroupProps) -> Self {
        Self {
            path,
            props,
            vpc_id,
            ingress: Vec::new(),
        }
    }

    pub fn add_ingress_rule(&mut self, peer: Peer, port: Port, description: &str) {
        self.ingress.push(Rule {
            peer,
            port,
            description: description.to_string(),
        });
    }

    #[must_use]
    pub fn ingress_rules(&self) -> &[Rule] {
        &self.ingress
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    #[must_use]
    pub fn group_id(&self) -> Expr {
        Expr::get_att(self.logical_id(), "GroupId")
    }

    /// # Errors
    ///
    /// Returns an error if the logical ID collides.
    pub fn render(&self, template: &mut Template) -> Result<(), StackError> {
        let egress = if self.props.allow_all_outbound {
            CfnEgress::Rules(vec![CfnRule::from(&Rule {
                peer: Peer::any_ipv4(),
                port: Port::all_traffic(),
                description: "Allow all outbound traffic by default".to_string(),
            })])
        } else {
            CfnEgress::DenyAll([DENY_ALL_EGRESS])
        };

        template.add_resource(
            &self.logical_id(),
            "AWS::EC2::SecurityGroup",
            &CfnSecurityGroup {
                group_description: self.props.description.clone(),
                group_name: self.props.name.clone(),
                security_group_egress: egress,
                security_group_ingress: self.ingress.iter().map(CfnRule::from).collect(),
                vpc_id: self.vpc_id.clone(),
            },
        )
    }
}
