//! IAM roles, managed policies and instance profiles.

use serde::Serialize;

use crate::domain::construct::ConstructPath;
use crate::domain::error::StackError;
use crate::domain::template::{AWS_PARTITION, Expr, Template};

const POLICY_VERSION: &str = "2012-10-17";

/// An AWS service allowed to assume a role, e.g. `ec2.amazonaws.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePrincipal(String);

impl ServicePrincipal {
    #[must_use]
    pub fn new(service: &str) -> Self {
        Self(service.to_string())
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.0
    }
}

/// A policy maintained by AWS and referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPolicy {
    name: String,
}

impl ManagedPolicy {
    #[must_use]
    pub fn from_aws_managed_policy_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `arn:${Partition}:iam::aws:policy/<name>`.
    #[must_use]
    pub fn arn(&self) -> Expr {
        Expr::Join(
            String::new(),
            vec![
                "arn:".into(),
                Expr::reference(AWS_PARTITION),
                format!(":iam::aws:policy/{}", self.name).into(),
            ],
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyDocument {
    statement: Vec<Statement>,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement {
    action: &'static str,
    effect: &'static str,
    principal: Principal,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Principal {
    service: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnRole {
    assume_role_policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    managed_policy_arns: Vec<Expr>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CfnInstanceProfile {
    roles: Vec<Expr>,
}

#[derive(Debug, Clone)]
pub struct Role {
    path: ConstructPath,
    assumed_by: ServicePrincipal,
    managed_policies: Vec<ManagedPolicy>,
}

impl Role {
    #[must_use]
    pub fn new(path: ConstructPath, assumed_by: ServicePrincipal) -> Self {
        Self {
            path,
            assumed_by,
            managed_policies: Vec::new(),
        }
    }

    pub fn add_managed_policy(&mut self, policy: ManagedPolicy) {
        if !self.managed_policies.contains(&policy) {
            self.managed_policies.push(policy);
        }
    }

    #[must_use]
    pub fn managed_policies(&self) -> &[ManagedPolicy] {
        &self.managed_policies
    }

    #[must_use]
    pub fn assumed_by(&self) -> &ServicePrincipal {
        &self.assumed_by
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.child("Resource").logical_id()
    }

    /// # Errors
    ///
    /// Returns an error if the logical ID collides.
    pub fn render(&self, template: &mut Template) -> Result<(), StackError> {
        template.add_resource(
            &self.logical_id(),
            "AWS::IAM::Role",
            &CfnRole {
                assume_role_policy_document: PolicyDocument {
                    statement: vec![Statement {
                        action: "sts:AssumeRole",
                        effect: "Allow",
                        principal: Principal {
                            service: self.assumed_by.service().to_string(),
                        },
                    }],
                    version: POLICY_VERSION,
                },
                managed_policy_arns: self.managed_policies.iter().map(ManagedPolicy::arn).collect(),
            },
        )
    }
}

/// Container that passes a role to an EC2 instance.
#[derive(Debug, Clone)]
pub struct InstanceProfile {
    path: ConstructPath,
    role_id: String,
}

impl InstanceProfile {
    #[must_use]
    pub fn new(path: ConstructPath, role: &Role) -> Self {
        Self {
            path,
            role_id: role.logical_id(),
        }
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        self.path.logical_id()
    }

    /// # Errors
    ///
    /// Returns an error if the logical ID collides.
    pub fn render(&self, template: &mut Template) -> Result<(), StackError> {
        template.add_resource(
            &self.logical_id(),
            "AWS::IAM::InstanceProfile",
            &CfnInstanceProfile {
                roles: vec![Expr::reference(self.role_id.clone())],
            },
        )
    }
}
