//! Construct tree primitives: scope, environment, paths and logical IDs.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Path components that never contribute to the human part of a logical ID.
const HIDDEN_COMPONENTS: &[&str] = &["Resource", "Default"];

/// Maximum logical ID length accepted by CloudFormation.
const MAX_LOGICAL_ID_LEN: usize = 255;

/// Number of hex characters of the path digest appended to logical IDs.
const DIGEST_LEN: usize = 8;

// ── Environment & scope ──────────────────────────────────────────────────────

/// Target account and region of a stack. Either may be left open, in which
/// case the template is resolved against the deployment environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Environment {
    /// An environment with neither account nor region pinned.
    #[must_use]
    pub fn agnostic() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_agnostic(&self) -> bool {
        self.region.is_none()
    }

    /// `aws://<account>/<region>`, with `unknown-*` placeholders for open fields.
    #[must_use]
    pub fn uri(&self) -> String {
        format!(
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

/// The root scope stacks are constructed in.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    env: Environment,
}

impl Scope {
    #[must_use]
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }
}

// ── Construct paths ──────────────────────────────────────────────────────────

/// Position of a construct inside a stack, e.g. `VPC/PublicSubnet1/Subnet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
    #[must_use]
    pub fn root(id: &str) -> Self {
        Self(vec![id.to_string()])
    }

    #[must_use]
    pub fn child(&self, id: &str) -> Self {
        let mut components = self.0.clone();
        components.push(id.to_string());
        Self(components)
    }

    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Path prefixed with the stack name, as used for `Name` tags.
    #[must_use]
    pub fn qualified(&self, stack_name: &str) -> String {
        format!("{stack_name}/{self}")
    }

    /// Template-unique logical ID for the construct at this path.
    ///
    /// Top-level constructs keep their ID. Nested ones get the concatenated
    /// visible components followed by a digest of the full path, so two
    /// paths that read the same once hidden components are dropped still
    /// produce different IDs.
    #[must_use]
    pub fn logical_id(&self) -> String {
        if let [only] = self.0.as_slice() {
            return alphanumeric(only);
        }

        let mut visible: Vec<&str> = Vec::with_capacity(self.0.len());
        for component in &self.0 {
            if HIDDEN_COMPONENTS.contains(&component.as_str()) {
                continue;
            }
            if visible.last() == Some(&component.as_str()) {
                continue;
            }
            visible.push(component);
        }

        let mut human = alphanumeric(&visible.concat());
        human.truncate(MAX_LOGICAL_ID_LEN - DIGEST_LEN);
        format!("{human}{}", path_digest(&self.0))
    }
}

impl fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

fn alphanumeric(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}

fn path_digest(components: &[String]) -> String {
    let digest = Sha256::digest(components.join("/").as_bytes());
    let mut hex = hex_encode(&digest);
    hex.truncate(DIGEST_LEN);
    hex.to_ascii_uppercase()
}

/// Lowercase hex encoding of a byte slice.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

// ── Tags ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    #[must_use]
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }

    /// The `Name` tag shown in the EC2 console.
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new("Name", value)
    }
}
