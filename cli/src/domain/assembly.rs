//! Cloud assembly layout: the directory `synth` writes for deployment tools.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::construct::{Environment, hex_encode};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_VERSION: &str = "1";
pub const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

/// File name of a stack's template inside the assembly.
#[must_use]
pub fn template_file_name(stack_name: &str) -> String {
    format!("{stack_name}.template.json")
}

/// Lowercase hex SHA-256 of the rendered template.
#[must_use]
pub fn template_digest(rendered: &str) -> String {
    hex_encode(&Sha256::digest(rendered.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub version: &'static str,
    pub artifacts: BTreeMap<String, Artifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub environment: String,
    pub properties: ArtifactProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    pub template_file: String,
}

impl Manifest {
    /// Manifest describing a single stack artifact.
    #[must_use]
    pub fn for_stack(stack_name: &str, env: &Environment) -> Self {
        let artifact = Artifact {
            kind: STACK_ARTIFACT_TYPE,
            environment: env.uri(),
            properties: ArtifactProperties {
                template_file: template_file_name(stack_name),
            },
        };
        Self {
            version: MANIFEST_VERSION,
            artifacts: BTreeMap::from([(stack_name.to_string(), artifact)]),
        }
    }
}
