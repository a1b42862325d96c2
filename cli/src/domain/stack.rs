//! The Helix Core stack: one `p4d` server behind a network load balancer.
//!
//! Construction wires every construct in a single pass; nothing here touches
//! the filesystem. The boot script arrives already loaded as [`UserData`].

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::compute::{
    BlockDevice, BlockDeviceVolume, Instance, InstanceClass, InstanceProps, InstanceSize,
    InstanceType, MachineImage, UserData,
};
use crate::domain::construct::{ConstructPath, Environment, Scope};
use crate::domain::error::StackError;
use crate::domain::iam::{ManagedPolicy, Role, ServicePrincipal};
use crate::domain::load_balancer::{
    HealthCheck, InstanceTarget, ListenerProps, NetworkLoadBalancer, NetworkLoadBalancerProps,
    Protocol, TargetGroupProps,
};
use crate::domain::network::{Ipv4Cidr, Vpc, VpcProps};
use crate::domain::security_group::{Peer, Port, SecurityGroup, SecurityGroupProps};
use crate::domain::template::{Export, Expr, Output, Template};

// ── Constants ────────────────────────────────────────────────────────────────

/// Port `p4d` listens on. Ingress rule, target, listener and target group all
/// use it; a mismatch forwards traffic to a closed port.
pub const P4D_PORT: u16 = 1666;

pub const DATA_VOLUME_GIB: u32 = 24;
pub const DATA_DEVICES: [&str; 2] = ["/dev/sdb", "/dev/sdc"];

pub const MAX_AZS: usize = 1;
pub const NAT_GATEWAYS: usize = 0;

pub const SSM_MANAGED_POLICY: &str = "AmazonSSMManagedInstanceCore";
pub const EC2_SERVICE: &str = "ec2.amazonaws.com";

pub const SECURITY_GROUP_NAME: &str = "HelixCore SecurityGroup";
pub const SECURITY_GROUP_DESCRIPTION: &str =
    "Allow tcp traffic from NLB to instances over port 1666";
pub const INGRESS_DESCRIPTION: &str = "allow tcp traffic from nlb";

pub const OUTPUT_LOAD_BALANCER: &str = "LoadBalancer";
pub const OUTPUT_INSTANCE_ID: &str = "InstanceID";

pub const DEFAULT_STACK_NAME: &str = "GameStudioStack";

const STACK_DESCRIPTION: &str = "Perforce Helix Core server behind a network load balancer";

/// Helix Core images per region.
pub const HELIX_CORE_AMIS: [(&str, &str); 4] = [
    ("us-east-1", "ami-0e09d7c1e4eb188b0"),
    ("us-east-2", "ami-07b3240efb4d0fdc9"),
    ("us-west-1", "ami-0650ca268c0db8b36"),
    ("us-west-2", "ami-08480a22ed805bcb0"),
];

static STACK_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern, cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z][A-Za-z0-9-]{0,127}$").expect("valid regex")
});

/// Validates a CloudFormation stack name.
///
/// # Errors
///
/// Returns an error if the name does not start with a letter, contains
/// anything other than letters, digits and hyphens, or exceeds 128 characters.
pub fn validate_stack_name(name: &str) -> Result<(), StackError> {
    if STACK_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(StackError::InvalidStackName(name.to_string()))
    }
}

#[must_use]
pub fn helix_core_image() -> MachineImage {
    MachineImage::generic_linux(HELIX_CORE_AMIS)
}

// ── Stack ────────────────────────────────────────────────────────────────────

/// A named stack output, exported under the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub name: &'static str,
    pub description: &'static str,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct GameStudioStack {
    name: String,
    env: Environment,
    vpc: Vpc,
    security_group: SecurityGroup,
    role: Role,
    instance: Instance,
    load_balancer: NetworkLoadBalancer,
    outputs: Vec<StackOutput>,
}

impl GameStudioStack {
    /// Construct the stack in `scope` with the stock Helix Core images.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not a valid stack name or the scope's
    /// region has no Helix Core image.
    pub fn new(scope: &Scope, id: &str, user_data: UserData) -> Result<Self, StackError> {
        Self::with_image(scope, id, user_data, &helix_core_image())
    }

    /// Construct the stack with a caller-supplied image table.
    ///
    /// # Errors
    ///
    /// Same as [`GameStudioStack::new`].
    pub fn with_image(
        scope: &Scope,
        id: &str,
        user_data: UserData,
        machine_image: &MachineImage,
    ) -> Result<Self, StackError> {
        validate_stack_name(id)?;
        let env = scope.env().clone();

        let vpc = Vpc::new(
            ConstructPath::root("VPC"),
            VpcProps {
                cidr: "10.0.0.0/16".parse::<Ipv4Cidr>()?,
                max_azs: MAX_AZS,
                nat_gateways: NAT_GATEWAYS,
            },
        )?;

        let mut security_group = SecurityGroup::new(
            ConstructPath::root("SecurityGroup"),
            vpc.vpc_id(),
            SecurityGroupProps {
                description: SECURITY_GROUP_DESCRIPTION.to_string(),
                name: Some(SECURITY_GROUP_NAME.to_string()),
                allow_all_outbound: true,
            },
        );
        security_group.add_ingress_rule(Peer::any_ipv4(), Port::tcp(P4D_PORT), INGRESS_DESCRIPTION);

        let mut role = Role::new(
            ConstructPath::root("CDKInstanceSSM"),
            ServicePrincipal::new(EC2_SERVICE),
        );
        role.add_managed_policy(ManagedPolicy::from_aws_managed_policy_name(SSM_MANAGED_POLICY));

        let instance = Instance::new(
            ConstructPath::root("P4DInstance"),
            &env,
            InstanceProps {
                subnet: vpc.default_instance_subnet(),
                instance_type: InstanceType::of(InstanceClass::Burstable3, InstanceSize::Large),
                machine_image,
                user_data,
                security_group_id: security_group.group_id(),
                role: &role,
                block_devices: DATA_DEVICES
                    .iter()
                    .map(|device| BlockDevice {
                        device_name: (*device).to_string(),
                        volume: BlockDeviceVolume::ebs(DATA_VOLUME_GIB),
                    })
                    .collect(),
            },
        )?;
        let target = InstanceTarget::new(instance.instance_id(), Some(P4D_PORT));

        let mut load_balancer = NetworkLoadBalancer::new(
            ConstructPath::root("LB"),
            NetworkLoadBalancerProps {
                vpc_id: vpc.vpc_id(),
                internet_facing: true,
                subnets: vpc.public_subnets().map(|s| s.subnet_id()).collect(),
                depends_on: vpc
                    .public_subnets()
                    .flat_map(|s| s.internet_route_ids())
                    .collect(),
            },
        );
        load_balancer
            .add_listener(
                "PublicListener",
                ListenerProps {
                    port: P4D_PORT,
                    protocol: None,
                },
            )
            .add_targets(
                "Ec2TargetGroup",
                TargetGroupProps {
                    port: P4D_PORT,
                    protocol: Protocol::Tcp,
                    targets: vec![target],
                    health_check: HealthCheck {
                        protocol: Some(Protocol::Tcp),
                        port: None,
                    },
                },
            );

        let outputs = vec![
            StackOutput {
                name: OUTPUT_LOAD_BALANCER,
                description: "Public DNS name of the network load balancer",
                value: load_balancer.dns_name(),
            },
            StackOutput {
                name: OUTPUT_INSTANCE_ID,
                description: "ID of the Helix Core instance",
                value: instance.instance_id(),
            },
        ];

        Ok(Self {
            name: id.to_string(),
            env,
            vpc,
            security_group,
            role,
            instance,
            load_balancer,
            outputs,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    #[must_use]
    pub fn vpc(&self) -> &Vpc {
        &self.vpc
    }

    #[must_use]
    pub fn security_group(&self) -> &SecurityGroup {
        &self.security_group
    }

    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    #[must_use]
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    #[must_use]
    pub fn load_balancer(&self) -> &NetworkLoadBalancer {
        &self.load_balancer
    }

    #[must_use]
    pub fn outputs(&self) -> &[StackOutput] {
        &self.outputs
    }

    /// Render the CloudFormation template.
    ///
    /// # Errors
    ///
    /// Returns an error if two constructs share a logical ID, a listener has
    /// no targets, or a reference does not resolve.
    pub fn synth(&self) -> Result<Template, StackError> {
        let mut template = Template::new(Some(STACK_DESCRIPTION.to_string()));

        self.vpc.render(&self.name, &mut template)?;
        self.security_group.render(&mut template)?;
        self.role.render(&mut template)?;
        self.instance.render(&self.name, &mut template)?;
        self.load_balancer.render(&mut template)?;

        for output in &self.outputs {
            template.add_output(
                &ConstructPath::root(output.name).logical_id(),
                Output {
                    description: Some(output.description.to_string()),
                    value: output.value.clone(),
                    export: Some(Export {
                        name: output.name.to_string(),
                    }),
                },
            )?;
        }

        template.validate_references()?;
        Ok(template)
    }
}
