//! CloudFormation template model.
//!
//! Constructs render into a [`Template`]; the template owns every declared
//! resource, mapping and output and checks that references between them
//! resolve before it is written anywhere.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::domain::error::StackError;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Pseudo parameter resolving to the region the stack is deployed in.
pub const AWS_REGION: &str = "AWS::Region";
/// Pseudo parameter resolving to the partition (`aws`, `aws-cn`, ...).
pub const AWS_PARTITION: &str = "AWS::Partition";

// ── Expressions ──────────────────────────────────────────────────────────────

/// A property value that may be resolved by CloudFormation at deploy time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Ref(String),
    GetAtt(String, String),
    FindInMap(String, Box<Expr>, String),
    Base64(Box<Expr>),
    Join(String, Vec<Expr>),
    Select(usize, Box<Expr>),
    /// `Fn::GetAZs ""`: the availability zones of the deployment region.
    GetAzs,
}

impl Expr {
    #[must_use]
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Self::Ref(logical_id.into())
    }

    #[must_use]
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::GetAtt(logical_id.into(), attribute.into())
    }

    /// The `index`-th availability zone of the deployment region.
    #[must_use]
    pub fn availability_zone(index: usize) -> Self {
        Self::Select(index, Box::new(Self::GetAzs))
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(s) => Value::String(s.clone()),
            Self::Ref(id) => json!({ "Ref": id }),
            Self::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id, attr] }),
            Self::FindInMap(map, top, second) => {
                json!({ "Fn::FindInMap": [map, top.to_value(), second] })
            }
            Self::Base64(inner) => json!({ "Fn::Base64": inner.to_value() }),
            Self::Join(delimiter, parts) => {
                let parts: Vec<Value> = parts.iter().map(Self::to_value).collect();
                json!({ "Fn::Join": [delimiter, parts] })
            }
            Self::Select(index, list) => json!({ "Fn::Select": [index, list.to_value()] }),
            Self::GetAzs => json!({ "Fn::GetAZs": "" }),
        }
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// ── Template ─────────────────────────────────────────────────────────────────

/// Two-level lookup table: top-level key (region) → second-level key → value.
pub type Mapping = BTreeMap<String, BTreeMap<String, String>>;

/// A declared resource: its CloudFormation type and rendered properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
}

/// A stack output, optionally exported for cross-stack consumption.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    pub name: String,
}

/// A synthesized CloudFormation template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Mappings", skip_serializing_if = "BTreeMap::is_empty")]
    pub mappings: BTreeMap<String, Mapping>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    #[must_use]
    pub fn new(description: Option<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description,
            mappings: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Declare a resource under `logical_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the logical ID is already taken or the properties
    /// cannot be rendered to JSON.
    pub fn add_resource(
        &mut self,
        logical_id: &str,
        kind: &str,
        properties: &impl Serialize,
    ) -> Result<(), StackError> {
        if self.resources.contains_key(logical_id) || self.outputs.contains_key(logical_id) {
            return Err(StackError::DuplicateLogicalId(logical_id.to_string()));
        }
        let properties = serde_json::to_value(properties).map_err(|source| StackError::Render {
            logical_id: logical_id.to_string(),
            source,
        })?;
        self.resources.insert(
            logical_id.to_string(),
            Resource {
                kind: kind.to_string(),
                properties,
                depends_on: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Record that `logical_id` must be created after each of `on`.
    ///
    /// Unknown `logical_id`s are ignored here and caught by
    /// [`Template::validate_references`] for the dependency targets.
    pub fn add_dependencies<I, S>(&mut self, logical_id: &str, on: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(resource) = self.resources.get_mut(logical_id) {
            resource.depends_on.extend(on.into_iter().map(Into::into));
        }
    }

    pub fn add_mapping(&mut self, name: &str, mapping: Mapping) {
        self.mappings.insert(name.to_string(), mapping);
    }

    /// Declare an output.
    ///
    /// # Errors
    ///
    /// Returns an error if the name collides with another output or resource.
    pub fn add_output(&mut self, name: &str, output: Output) -> Result<(), StackError> {
        if self.outputs.contains_key(name) || self.resources.contains_key(name) {
            return Err(StackError::DuplicateLogicalId(name.to_string()));
        }
        self.outputs.insert(name.to_string(), output);
        Ok(())
    }

    /// All resources of the given CloudFormation type, in logical ID order.
    pub fn resources_of_type<'a, 'k>(
        &'a self,
        kind: &'k str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + use<'a, 'k> {
        self.resources.iter().filter(move |(_, r)| r.kind == kind)
    }

    /// Check that every `Ref`, `Fn::GetAtt`, `Fn::FindInMap` and `DependsOn`
    /// names something declared in this template.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DanglingReference`] for the first unresolved name.
    pub fn validate_references(&self) -> Result<(), StackError> {
        for (id, resource) in &self.resources {
            let mut refs = References::default();
            refs.collect(&resource.properties);
            refs.logical_ids.extend(resource.depends_on.iter().cloned());
            self.check_references(id, &refs)?;
        }
        for (name, output) in &self.outputs {
            let mut refs = References::default();
            refs.collect(&output.value.to_value());
            self.check_references(name, &refs)?;
        }
        Ok(())
    }

    fn check_references(&self, from: &str, refs: &References) -> Result<(), StackError> {
        let dangling = refs
            .logical_ids
            .iter()
            .filter(|target| !target.starts_with("AWS::"))
            .find(|target| !self.resources.contains_key(*target))
            .or_else(|| {
                refs.mappings
                    .iter()
                    .find(|map| !self.mappings.contains_key(*map))
            });
        match dangling {
            Some(target) => Err(StackError::DanglingReference {
                from: from.to_string(),
                target: target.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Render as pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

#[derive(Default)]
struct References {
    logical_ids: BTreeSet<String>,
    mappings: BTreeSet<String>,
}

impl References {
    fn collect(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(id)) = map.get("Ref") {
                    self.logical_ids.insert(id.clone());
                }
                if let Some(Value::String(id)) = map.get("Fn::GetAtt").and_then(|v| v.get(0)) {
                    self.logical_ids.insert(id.clone());
                }
                if let Some(Value::String(name)) = map.get("Fn::FindInMap").and_then(|v| v.get(0))
                {
                    self.mappings.insert(name.clone());
                }
                map.values().for_each(|v| self.collect(v));
            }
            Value::Array(items) => items.iter().for_each(|v| self.collect(v)),
            _ => {}
        }
    }
}
