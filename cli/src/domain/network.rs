//! Virtual network: CIDR value object, subnet layout and VPC rendering.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::construct::{ConstructPath, Tag};
use crate::domain::error::StackError;
use crate::domain::template::{Expr, Template};

/// Smallest subnet AWS allows.
const MAX_SUBNET_PREFIX: u8 = 28;

pub const ANY_IPV4: &str = "0.0.0.0/0";

// ── CIDR ─────────────────────────────────────────────────────────────────────

/// IPv4 network in CIDR notation.
///
/// Invariants:
/// - prefix length is 0-32
/// - the address has no host bits set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    network: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// # Errors
    ///
    /// Returns an error if the prefix exceeds 32 or host bits are set.
    pub fn new(network: Ipv4Addr, prefix: u8) -> Result<Self, StackError> {
        if prefix > 32 {
            return Err(StackError::InvalidCidr(format!("{network}/{prefix}")));
        }
        if u32::from(network) & !mask(prefix) != 0 {
            return Err(StackError::InvalidCidr(format!(
                "{network}/{prefix} has host bits set"
            )));
        }
        Ok(Self { network, prefix })
    }

    /// `0.0.0.0/0`.
    #[must_use]
    pub fn any() -> Self {
        Self {
            network: Ipv4Addr::UNSPECIFIED,
            prefix: 0,
        }
    }

    #[must_use]
    pub fn network(&self) -> Ipv4Addr {
        self.network
    }

    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Split into `count` equally sized, consecutive blocks.
    ///
    /// The block size is the largest power of two that fits `count` blocks,
    /// so trailing address space stays unallocated when `count` is not a
    /// power of two.
    ///
    /// # Errors
    ///
    /// Returns an error if the blocks would be smaller than a /28.
    pub fn split(&self, count: usize) -> Result<Vec<Self>, StackError> {
        let exhausted = || StackError::CidrExhausted {
            cidr: self.to_string(),
            count,
        };
        if count == 0 {
            return Ok(Vec::new());
        }
        let extra_bits = u8::try_from(count.next_power_of_two().trailing_zeros())
            .map_err(|_| exhausted())?;
        let prefix = self.prefix.checked_add(extra_bits).ok_or_else(exhausted)?;
        if prefix > MAX_SUBNET_PREFIX {
            return Err(exhausted());
        }
        let block = 1u64 << (32 - u32::from(prefix));
        let base = u64::from(u32::from(self.network));
        (0..count)
            .map(|i| {
                let start = base + u64::try_from(i).map_err(|_| exhausted())? * block;
                let start = u32::try_from(start).map_err(|_| exhausted())?;
                Self::new(Ipv4Addr::from(start), prefix)
            })
            .collect()
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix))
    }
}

impl FromStr for Ipv4Cidr {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| StackError::InvalidCidr(s.to_string()))?;
        let network =
            Ipv4Addr::from_str(addr).map_err(|_| StackError::InvalidCidr(s.to_string()))?;
        let prefix = prefix
            .parse::<u8>()
            .map_err(|_| StackError::InvalidCidr(s.to_string()))?;
        Self::new(network, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Subnets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetType {
    /// Routes to the internet gateway; instances get public IPs.
    Public,
    /// Outbound internet through a NAT gateway only.
    PrivateWithEgress,
    /// No route out of the VPC.
    Isolated,
}

impl SubnetType {
    fn label(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::PrivateWithEgress => "Private",
            Self::Isolated => "Isolated",
        }
    }
}

/// One subnet of the VPC together with its route table.
#[derive(Debug, Clone)]
pub struct Subnet {
    path: ConstructPath,
    kind: SubnetType,
    az_index: usize,
    cidr: Ipv4Cidr,
    /// NAT gateway this subnet hosts (public) or routes through (private).
    nat_gateway: Option<String>,
}

impl Subnet {
    #[must_use]
    pub fn kind(&self) -> SubnetType {
        self.kind
    }

    #[must_use]
    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    #[must_use]
    pub fn availability_zone(&self) -> Expr {
        Expr::availability_zone(self.az_index)
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Subnet").logical_id()
    }

    #[must_use]
    pub fn subnet_id(&self) -> Expr {
        Expr::reference(self.logical_id())
    }

    fn route_table_id(&self) -> String {
        self.path.child("RouteTable").logical_id()
    }

    fn association_id(&self) -> String {
        self.path.child("RouteTableAssociation").logical_id()
    }

    fn default_route_id(&self) -> String {
        self.path.child("DefaultRoute").logical_id()
    }

    /// Resources that make the subnet reachable from the internet. Internet
    /// facing load balancers must not be created before these exist.
    #[must_use]
    pub fn internet_route_ids(&self) -> Vec<String> {
        match self.kind {
            SubnetType::Public => vec![self.default_route_id(), self.association_id()],
            SubnetType::PrivateWithEgress | SubnetType::Isolated => Vec::new(),
        }
    }
}

// ── VPC ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct VpcProps {
    pub cidr: Ipv4Cidr,
    pub max_azs: usize,
    pub nat_gateways: usize,
}

impl Default for VpcProps {
    fn default() -> Self {
        Self {
            cidr: Ipv4Cidr {
                network: Ipv4Addr::new(10, 0, 0, 0),
                prefix: 16,
            },
            max_azs: 3,
            nat_gateways: 3,
        }
    }
}

/// A VPC with one public and one non-public subnet per availability zone.
#[derive(Debug, Clone)]
pub struct Vpc {
    path: ConstructPath,
    props: VpcProps,
    subnets: Vec<Subnet>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnVpc {
    cidr_block: Ipv4Cidr,
    enable_dns_hostnames: bool,
    enable_dns_support: bool,
    instance_tenancy: &'static str,
    tags: Vec<Tag>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnSubnet {
    availability_zone: Expr,
    cidr_block: Ipv4Cidr,
    map_public_ip_on_launch: bool,
    tags: Vec<Tag>,
    vpc_id: Expr,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnRouteTable {
    tags: Vec<Tag>,
    vpc_id: Expr,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnRouteTableAssociation {
    route_table_id: Expr,
    subnet_id: Expr,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnRoute {
    destination_cidr_block: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway_id: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nat_gateway_id: Option<Expr>,
    route_table_id: Expr,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnEip {
    domain: &'static str,
    tags: Vec<Tag>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnNatGateway {
    allocation_id: Expr,
    subnet_id: Expr,
    tags: Vec<Tag>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnTagsOnly {
    tags: Vec<Tag>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnGatewayAttachment {
    internet_gateway_id: Expr,
    vpc_id: Expr,
}

impl Vpc {
    /// Lay out subnets for `props`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no availability zones, more NAT gateways
    /// than availability zones, or the CIDR is too small for the subnets.
    pub fn new(path: ConstructPath, props: VpcProps) -> Result<Self, StackError> {
        if props.max_azs == 0 {
            return Err(StackError::InvalidNetwork(
                "at least one availability zone is required".to_string(),
            ));
        }
        if props.nat_gateways > props.max_azs {
            return Err(StackError::InvalidNetwork(format!(
                "{} NAT gateways requested but only {} availability zones",
                props.nat_gateways, props.max_azs
            )));
        }

        let private_kind = if props.nat_gateways > 0 {
            SubnetType::PrivateWithEgress
        } else {
            SubnetType::Isolated
        };
        let blocks = props.cidr.split(props.max_azs * 2)?;
        let (public_blocks, private_blocks) = blocks.split_at(props.max_azs);

        let mut subnets = Vec::with_capacity(blocks.len());
        for (az, cidr) in public_blocks.iter().enumerate() {
            let sub_path = path.child(&format!("{}Subnet{}", SubnetType::Public.label(), az + 1));
            let nat_gateway = (az < props.nat_gateways).then(|| sub_path.child("NATGateway").logical_id());
            subnets.push(Subnet {
                path: sub_path,
                kind: SubnetType::Public,
                az_index: az,
                cidr: *cidr,
                nat_gateway,
            });
        }
        for (az, cidr) in private_blocks.iter().enumerate() {
            // Private subnets share the NAT gateways round-robin.
            let nat_gateway = if private_kind == SubnetType::PrivateWithEgress {
                subnets[az % props.nat_gateways].nat_gateway.clone()
            } else {
                None
            };
            subnets.push(Subnet {
                path: path.child(&format!("{}Subnet{}", private_kind.label(), az + 1)),
                kind: private_kind,
                az_index: az,
                cidr: *cidr,
                nat_gateway,
            });
        }

        Ok(Self {
            path,
            props,
            subnets,
        })
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    #[must_use]
    pub fn vpc_id(&self) -> Expr {
        Expr::reference(self.logical_id())
    }

    #[must_use]
    pub fn max_azs(&self) -> usize {
        self.props.max_azs
    }

    #[must_use]
    pub fn nat_gateways(&self) -> usize {
        self.props.nat_gateways
    }

    #[must_use]
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn public_subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(|s| s.kind == SubnetType::Public)
    }

    /// Default placement for instances: private subnets first, then
    /// isolated, then public.
    #[must_use]
    pub fn default_instance_subnet(&self) -> &Subnet {
        [
            SubnetType::PrivateWithEgress,
            SubnetType::Isolated,
            SubnetType::Public,
        ]
        .iter()
        .find_map(|kind| self.subnets.iter().find(|s| s.kind == *kind))
        .unwrap_or(&self.subnets[0])
    }

    fn igw_id(&self) -> String {
        self.path.child("IGW").logical_id()
    }

    fn gateway_attachment_id(&self) -> String {
        self.path.child("VPCGW").logical_id()
    }

    /// Render the VPC, its gateways and every subnet.
    ///
    /// # Errors
    ///
    /// Returns an error if a logical ID collides.
    pub fn render(&self, stack_name: &str, template: &mut Template) -> Result<(), StackError> {
        let vpc_name = self.path.qualified(stack_name);
        template.add_resource(
            &self.logical_id(),
            "AWS::EC2::VPC",
            &CfnVpc {
                cidr_block: self.props.cidr,
                enable_dns_hostnames: true,
                enable_dns_support: true,
                instance_tenancy: "default",
                tags: vec![Tag::name(vpc_name.clone())],
            },
        )?;

        for subnet in &self.subnets {
            self.render_subnet(stack_name, subnet, template)?;
        }

        template.add_resource(
            &self.igw_id(),
            "AWS::EC2::InternetGateway",
            &CfnTagsOnly {
                tags: vec![Tag::name(vpc_name)],
            },
        )?;
        template.add_resource(
            &self.gateway_attachment_id(),
            "AWS::EC2::VPCGatewayAttachment",
            &CfnGatewayAttachment {
                internet_gateway_id: Expr::reference(self.igw_id()),
                vpc_id: self.vpc_id(),
            },
        )?;
        Ok(())
    }

    fn render_subnet(
        &self,
        stack_name: &str,
        subnet: &Subnet,
        template: &mut Template,
    ) -> Result<(), StackError> {
        let name = subnet.path.qualified(stack_name);

        template.add_resource(
            &subnet.logical_id(),
            "AWS::EC2::Subnet",
            &CfnSubnet {
                availability_zone: subnet.availability_zone(),
                cidr_block: subnet.cidr,
                map_public_ip_on_launch: subnet.kind == SubnetType::Public,
                tags: vec![
                    Tag::new("aws-cdk:subnet-name", subnet.kind.label()),
                    Tag::new("aws-cdk:subnet-type", subnet.kind.label()),
                    Tag::name(name.clone()),
                ],
                vpc_id: self.vpc_id(),
            },
        )?;
        template.add_resource(
            &subnet.route_table_id(),
            "AWS::EC2::RouteTable",
            &CfnRouteTable {
                tags: vec![Tag::name(name.clone())],
                vpc_id: self.vpc_id(),
            },
        )?;
        template.add_resource(
            &subnet.association_id(),
            "AWS::EC2::SubnetRouteTableAssociation",
            &CfnRouteTableAssociation {
                route_table_id: Expr::reference(subnet.route_table_id()),
                subnet_id: subnet.subnet_id(),
            },
        )?;

        match subnet.kind {
            SubnetType::Public => {
                template.add_resource(
                    &subnet.default_route_id(),
                    "AWS::EC2::Route",
                    &CfnRoute {
                        destination_cidr_block: ANY_IPV4,
                        gateway_id: Some(Expr::reference(self.igw_id())),
                        nat_gateway_id: None,
                        route_table_id: Expr::reference(subnet.route_table_id()),
                    },
                )?;
                template.add_dependencies(&subnet.default_route_id(), [self.gateway_attachment_id()]);

                if let Some(nat_id) = &subnet.nat_gateway {
                    let eip_id = subnet.path.child("EIP").logical_id();
                    template.add_resource(
                        &eip_id,
                        "AWS::EC2::EIP",
                        &CfnEip {
                            domain: "vpc",
                            tags: vec![Tag::name(name.clone())],
                        },
                    )?;
                    template.add_resource(
                        nat_id,
                        "AWS::EC2::NatGateway",
                        &CfnNatGateway {
                            allocation_id: Expr::get_att(eip_id, "AllocationId"),
                            subnet_id: subnet.subnet_id(),
                            tags: vec![Tag::name(name)],
                        },
                    )?;
                    template.add_dependencies(nat_id, subnet.internet_route_ids());
                }
            }
            SubnetType::PrivateWithEgress => {
                if let Some(nat_id) = &subnet.nat_gateway {
                    template.add_resource(
                        &subnet.default_route_id(),
                        "AWS::EC2::Route",
                        &CfnRoute {
                            destination_cidr_block: ANY_IPV4,
                            gateway_id: None,
                            nat_gateway_id: Some(Expr::reference(nat_id.clone())),
                            route_table_id: Expr::reference(subnet.route_table_id()),
                        },
                    )?;
                }
            }
            SubnetType::Isolated => {}
        }
        Ok(())
    }
}
