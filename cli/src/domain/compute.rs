//! EC2 instances: instance types, machine images, user data and block devices.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::domain::construct::{ConstructPath, Environment, Tag};
use crate::domain::error::StackError;
use crate::domain::iam::{InstanceProfile, Role};
use crate::domain::network::Subnet;
use crate::domain::template::{AWS_REGION, Expr, Mapping, Template};

// ── Instance type ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceClass {
    Burstable3,
    Compute5,
}

impl InstanceClass {
    fn prefix(self) -> &'static str {
        match self {
            Self::Burstable3 => "t3",
            Self::Compute5 => "c5",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceSize {
    Large,
    Xlarge2,
}

impl InstanceSize {
    fn suffix(self) -> &'static str {
        match self {
            Self::Large => "large",
            Self::Xlarge2 => "2xlarge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceType {
    class: InstanceClass,
    size: InstanceSize,
}

impl InstanceType {
    #[must_use]
    pub fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.prefix(), self.size.suffix())
    }
}

// ── Machine image ────────────────────────────────────────────────────────────

/// A Linux image chosen per region from a fixed table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineImage {
    amis: BTreeMap<String, String>,
}

impl MachineImage {
    #[must_use]
    pub fn generic_linux<I, R, A>(amis: I) -> Self
    where
        I: IntoIterator<Item = (R, A)>,
        R: Into<String>,
        A: Into<String>,
    {
        Self {
            amis: amis
                .into_iter()
                .map(|(region, ami)| (region.into(), ami.into()))
                .collect(),
        }
    }

    #[must_use]
    pub fn regions(&self) -> Vec<&str> {
        self.amis.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn ami_for(&self, region: &str) -> Option<&str> {
        self.amis.get(region).map(String::as_str)
    }

    fn mapping(&self) -> Mapping {
        self.amis
            .iter()
            .map(|(region, ami)| {
                let entry = BTreeMap::from([("ami".to_string(), ami.clone())]);
                (region.clone(), entry)
            })
            .collect()
    }
}

/// How the instance's `ImageId` is rendered for a given environment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolvedImage {
    /// Region known at synthesis time.
    Fixed(String),
    /// Looked up at deploy time from a template mapping.
    Mapped { map_name: String, mapping: Mapping },
}

impl ResolvedImage {
    fn resolve(image: &MachineImage, env: &Environment, map_name: String) -> Result<Self, StackError> {
        match &env.region {
            Some(region) => image
                .ami_for(region)
                .map(|ami| Self::Fixed(ami.to_string()))
                .ok_or_else(|| StackError::MissingImageForRegion {
                    region: region.clone(),
                    available: image.regions().join(", "),
                }),
            None => Ok(Self::Mapped {
                map_name,
                mapping: image.mapping(),
            }),
        }
    }

    fn image_id(&self) -> Expr {
        match self {
            Self::Fixed(ami) => Expr::Literal(ami.clone()),
            Self::Mapped { map_name, .. } => Expr::FindInMap(
                map_name.clone(),
                Box::new(Expr::reference(AWS_REGION)),
                "ami".to_string(),
            ),
        }
    }
}

// ── User data ────────────────────────────────────────────────────────────────

/// Commands run once at first boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    shebang: &'static str,
    lines: Vec<String>,
}

impl UserData {
    #[must_use]
    pub fn for_linux() -> Self {
        Self {
            shebang: "#!/bin/bash",
            lines: Vec::new(),
        }
    }

    /// Append commands verbatim.
    pub fn add_commands(&mut self, commands: &str) {
        self.lines.push(commands.to_string());
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from(self.shebang);
        for line in &self.lines {
            out.push('\n');
            out.push_str(line);
        }
        out
    }
}

// ── Block devices ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EbsVolume {
    pub volume_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDeviceVolume {
    Ebs(EbsVolume),
}

impl BlockDeviceVolume {
    /// An EBS volume of `size_gib` GiB.
    #[must_use]
    pub fn ebs(size_gib: u32) -> Self {
        Self::Ebs(EbsVolume {
            volume_size: size_gib,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub device_name: String,
    pub volume: BlockDeviceVolume,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnBlockDeviceMapping {
    device_name: String,
    ebs: EbsVolume,
}

impl From<&BlockDevice> for CfnBlockDeviceMapping {
    fn from(device: &BlockDevice) -> Self {
        let BlockDeviceVolume::Ebs(ebs) = device.volume;
        Self {
            device_name: device.device_name.clone(),
            ebs,
        }
    }
}

// ── Instance ─────────────────────────────────────────────────────────────────

pub struct InstanceProps<'a> {
    pub subnet: &'a Subnet,
    pub instance_type: InstanceType,
    pub machine_image: &'a MachineImage,
    pub user_data: UserData,
    pub security_group_id: Expr,
    pub role: &'a Role,
    pub block_devices: Vec<BlockDevice>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnInstance {
    availability_zone: Expr,
    block_device_mappings: Vec<CfnBlockDeviceMapping>,
    iam_instance_profile: Expr,
    image_id: Expr,
    instance_type: String,
    security_group_ids: Vec<Expr>,
    subnet_id: Expr,
    tags: Vec<Tag>,
    user_data: Expr,
}

#[derive(Debug, Clone)]
pub struct Instance {
    path: ConstructPath,
    availability_zone: Expr,
    subnet_id: Expr,
    instance_type: InstanceType,
    image: ResolvedImage,
    user_data: UserData,
    security_group_id: Expr,
    role_id: String,
    profile: InstanceProfile,
    block_devices: Vec<BlockDevice>,
}

impl Instance {
    /// # Errors
    ///
    /// Returns an error if the environment's region has no machine image or a
    /// block device has a zero-sized volume.
    pub fn new(path: ConstructPath, env: &Environment, props: InstanceProps<'_>) -> Result<Self, StackError> {
        for device in &props.block_devices {
            let BlockDeviceVolume::Ebs(ebs) = device.volume;
            if ebs.volume_size == 0 {
                return Err(StackError::InvalidVolumeSize {
                    device: device.device_name.clone(),
                });
            }
        }
        let image = ResolvedImage::resolve(
            props.machine_image,
            env,
            path.child("AmiMap").logical_id(),
        )?;
        let profile = InstanceProfile::new(path.child("InstanceProfile"), props.role);

        Ok(Self {
            availability_zone: props.subnet.availability_zone(),
            subnet_id: props.subnet.subnet_id(),
            instance_type: props.instance_type,
            image,
            user_data: props.user_data,
            security_group_id: props.security_group_id,
            role_id: props.role.logical_id(),
            profile,
            block_devices: props.block_devices,
            path,
        })
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    #[must_use]
    pub fn instance_id(&self) -> Expr {
        Expr::reference(self.logical_id())
    }

    #[must_use]
    pub fn instance_type(&self) -> InstanceType {
        self.instance_type
    }

    #[must_use]
    pub fn block_devices(&self) -> &[BlockDevice] {
        &self.block_devices
    }

    #[must_use]
    pub fn user_data(&self) -> &UserData {
        &self.user_data
    }

    /// Render the instance and its instance profile.
    ///
    /// # Errors
    ///
    /// Returns an error if a logical ID collides.
    pub fn render(&self, stack_name: &str, template: &mut Template) -> Result<(), StackError> {
        if let ResolvedImage::Mapped { map_name, mapping } = &self.image {
            template.add_mapping(map_name, mapping.clone());
        }
        self.profile.render(template)?;

        let id = self.logical_id();
        template.add_resource(
            &id,
            "AWS::EC2::Instance",
            &CfnInstance {
                availability_zone: self.availability_zone.clone(),
                block_device_mappings: self.block_devices.iter().map(CfnBlockDeviceMapping::from).collect(),
                iam_instance_profile: Expr::reference(self.profile.logical_id()),
                image_id: self.image.image_id(),
                instance_type: self.instance_type.to_string(),
                security_group_ids: vec![self.security_group_id.clone()],
                subnet_id: self.subnet_id.clone(),
                tags: vec![Tag::name(self.path.qualified(stack_name))],
                user_data: Expr::Base64(Box::new(Expr::Literal(self.user_data.render()))),
            },
        )?;
        // The profile only lists the role; make sure it exists before boot.
        template.add_dependencies(&id, [self.role_id.clone()]);
        Ok(())
    }
}
