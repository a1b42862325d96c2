//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Stack errors ──────────────────────────────────────────────────────────────

/// Errors raised while constructing or synthesizing a stack.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Invalid stack name '{0}': must match ^[A-Za-z][A-Za-z0-9-]*$ and be at most 128 characters")]
    InvalidStackName(String),

    #[error("Invalid CIDR block: {0}")]
    InvalidCidr(String),

    #[error("Cannot split {cidr} into {count} subnets of at least /28")]
    CidrExhausted { cidr: String, count: usize },

    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("No machine image for region '{region}'. Available regions: {available}")]
    MissingImageForRegion { region: String, available: String },

    #[error("Invalid block device {device}: volume size must be at least 1 GiB")]
    InvalidVolumeSize { device: String },

    #[error("Listener '{0}' has no target groups; a listener needs at least one default action")]
    ListenerWithoutTargets(String),

    #[error("Duplicate logical ID '{0}' in template")]
    DuplicateLogicalId(String),

    #[error("'{from}' references undeclared '{target}'")]
    DanglingReference { from: String, target: String },

    #[error("Cannot render properties of '{logical_id}'")]
    Render {
        logical_id: String,
        #[source]
        source: serde_json::Error,
    },
}

// ── Boot script errors ────────────────────────────────────────────────────────

/// Errors raised while loading the instance boot script.
#[derive(Debug, Error)]
pub enum BootScriptError {
    #[error("Boot script not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Boot script {} is not valid UTF-8", .0.display())]
    NotUtf8(PathBuf),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}
