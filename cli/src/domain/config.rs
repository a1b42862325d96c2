//! Domain types and validators for project configuration.
//!
//! Pure functions only: no I/O, no filesystem access.

use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::construct::Environment;
use crate::domain::error::ConfigError;
use crate::domain::stack::{DEFAULT_STACK_NAME, validate_stack_name};

// ── Constants ────────────────────────────────────────────────────────────────

pub const CONFIG_FILE_NAME: &str = "game-studio.yaml";
pub const DEFAULT_BOOT_SCRIPT: &str = "./p4d-files/configure-p4d.sh";
pub const DEFAULT_OUTPUT_DIR: &str = "cdk.out";

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "stack.name",
    "stack.account",
    "stack.region",
    "boot_script",
    "output_dir",
];

/// Value that clears an optional setting.
pub const UNSET: &str = "none";

/// AWS region code, e.g. `us-east-1` or `us-gov-west-1`.
static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern, cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d$").expect("valid regex")
});

static ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\d{12}$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `./game-studio.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub stack: StackSettings,
    /// Script run on the instance at first boot.
    pub boot_script: PathBuf,
    /// Directory the cloud assembly is written to.
    pub output_dir: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            stack: StackSettings::default(),
            boot_script: PathBuf::from(DEFAULT_BOOT_SCRIPT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Stack identity and target environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    pub name: String,
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_STACK_NAME.to_string(),
            account: None,
            region: None,
        }
    }
}

impl StudioConfig {
    /// Target environment, with per-invocation overrides taking precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the effective region or account is malformed,
    /// whether it came from an override or a hand-edited config file.
    pub fn environment(&self, region: Option<&str>, account: Option<&str>) -> Result<Environment> {
        let region = region.or(self.stack.region.as_deref()).filter(|v| *v != UNSET);
        let account = account.or(self.stack.account.as_deref()).filter(|v| *v != UNSET);
        if let Some(region) = region {
            validate_config_value("stack.region", region)?;
        }
        if let Some(account) = account {
            validate_config_value("stack.account", account)?;
        }
        Ok(Environment {
            account: account.map(str::to_string),
            region: region.map(str::to_string),
        })
    }

    /// Current value of a setting, `None` for an unset optional key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        validate_config_key(key)?;
        Ok(match key {
            "stack.name" => Some(self.stack.name.clone()),
            "stack.account" => self.stack.account.clone(),
            "stack.region" => self.stack.region.clone(),
            "boot_script" => Some(self.boot_script.display().to_string()),
            _ => Some(self.output_dir.display().to_string()),
        })
    }

    /// Validates and applies one setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        let optional = (value != UNSET).then(|| value.to_string());
        match key {
            "stack.name" => self.stack.name = value.to_string(),
            "stack.account" => self.stack.account = optional,
            "stack.region" => self.stack.region = optional,
            "boot_script" => self.boot_script = PathBuf::from(value),
            _ => self.output_dir = PathBuf::from(value),
        }
        Ok(())
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |expected: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    };

    match key {
        "stack.name" => {
            if validate_stack_name(value).is_err() {
                return Err(invalid(
                    "a letter followed by letters, digits or hyphens (at most 128 characters)",
                )
                .into());
            }
        }
        "stack.region" if value != UNSET && !REGION_RE.is_match(value) => {
            return Err(invalid("an AWS region such as us-east-1, or 'none'").into());
        }
        "stack.account" if value != UNSET && !ACCOUNT_RE.is_match(value) => {
            return Err(invalid("a 12-digit AWS account ID, or 'none'").into());
        }
        "boot_script" | "output_dir" if value.trim().is_empty() => {
            return Err(invalid("a non-empty path").into());
        }
        _ => {}
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
