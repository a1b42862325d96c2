//! Domain layer: constructs, template model, checks and configuration.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, or `std::process`.
//! All functions are synchronous and take data in, returning data out.

pub mod assembly;
pub mod checks;
pub mod compute;
pub mod config;
pub mod construct;
pub mod error;
pub mod iam;
pub mod load_balancer;
pub mod network;
pub mod security_group;
pub mod stack;
pub mod template;

pub use checks::{CheckResult, StackChecks};
pub use config::{StudioConfig, validate_config_key, validate_config_value};
pub use construct::{Environment, Scope};
pub use error::{BootScriptError, ConfigError, StackError};
pub use stack::GameStudioStack;
pub use template::Template;
