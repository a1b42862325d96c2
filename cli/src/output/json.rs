//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed JSON document
//! on stdout, including failures (see [`format_error`]).

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::application::services::synth::AssemblyReport;
use crate::domain::checks::StackChecks;
use crate::domain::config::StudioConfig;
use crate::domain::error::{BootScriptError, ConfigError, StackError};
use crate::domain::stack::StackOutput;
use crate::domain::template::Template;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable code for an error chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<BootScriptError>() {
            return match e {
                BootScriptError::NotFound(_) => "BOOT_SCRIPT_NOT_FOUND",
                BootScriptError::NotUtf8(_) => "BOOT_SCRIPT_NOT_UTF8",
            };
        }
        if let Some(e) = cause.downcast_ref::<StackError>() {
            return match e {
                StackError::MissingImageForRegion { .. } => "MISSING_IMAGE_FOR_REGION",
                StackError::InvalidStackName(_) => "INVALID_STACK_NAME",
                _ => "SYNTH_FAILED",
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "INVALID_CONFIG";
        }
    }
    "ERROR"
}

/// Renders domain types as JSON on stdout.
pub struct JsonRenderer;

fn print(value: &serde_json::Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

impl JsonRenderer {
    /// Render `{"version": ...}`.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }

    /// Render the configuration and its file path.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(config: &StudioConfig, path: &Path) -> Result<()> {
        print(&json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// Render the assembly written by `synth`.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_synth(stack: &str, template: &Template, report: &AssemblyReport) -> Result<()> {
        print(&json!({
            "stack": stack,
            "resources": template.resources.len(),
            "outputs": template.outputs.len(),
            "template": report.template_path.display().to_string(),
            "manifest": report.manifest_path.display().to_string(),
            "sha256": report.digest,
        }))
    }

    /// Render check results.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_checks(stack: &str, checks: &StackChecks) -> Result<()> {
        print(&json!({
            "stack": stack,
            "passed": checks.all_passed(),
            "results": checks.results,
        }))
    }

    /// Render exported outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_outputs(outputs: &[StackOutput]) -> Result<()> {
        let outputs: Vec<_> = outputs
            .iter()
            .map(|o| {
                json!({
                    "name": o.name,
                    "description": o.description,
                    "value": o.value,
                    "export": o.name,
                })
            })
            .collect();
        print(&json!({ "outputs": outputs }))
    }

    /// Render resources as `{logical_id, type}` objects.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_resources(template: &Template) -> Result<()> {
        let resources: Vec<_> = template
            .resources
            .iter()
            .map(|(id, r)| json!({ "logical_id": id, "type": r.kind }))
            .collect();
        print(&json!({ "resources": resources }))
    }
}
