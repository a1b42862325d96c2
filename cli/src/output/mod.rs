//! Output formatting module

pub mod human;
pub mod json;
pub mod styles;

use std::path::Path;

use anyhow::Result;
use console::Term;
use owo_colors::OwoColorize as _;
pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use styles::Styles;

use crate::application::services::synth::AssemblyReport;
use crate::domain::checks::StackChecks;
use crate::domain::config::StudioConfig;
use crate::domain::stack::StackOutput;
use crate::domain::template::Template;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Print a success message prefixed with `✓`. Suppressed when `quiet`.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// Print a warning message prefixed with `⚠`. Suppressed when `quiet`.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// Print a failure line prefixed with `✗`. Never suppressed.
    pub fn failure(&self, msg: &str) {
        println!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print a section header. Suppressed when `quiet`.
    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Print a key-value pair with the key dimmed. Suppressed when `quiet`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Dispatches rendering to the human or JSON renderer.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_version(version),
        }
    }

    /// Render the effective configuration and where it lives.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(&self, config: &StudioConfig, path: &Path) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_config(config, path),
        }
    }

    /// Render the result of writing a cloud assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_synth(&self, stack: &str, template: &Template, report: &AssemblyReport) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_synth(stack, template, report);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_synth(stack, template, report),
        }
    }

    /// Render structural check results.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_checks(&self, stack: &str, checks: &StackChecks) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_checks(stack, checks);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_checks(stack, checks),
        }
    }

    /// Render the stack's exported outputs.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_outputs(&self, outputs: &[StackOutput]) -> Result<()> {
        match self {
            Self::Human(r) => r.render_outputs(outputs),
            Self::Json(_) => JsonRenderer::render_outputs(outputs),
        }
    }

    /// Render the synthesized resources.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_resources(&self, template: &Template) -> Result<()> {
        match self {
            Self::Human(r) => {
                r.render_resources(template);
                Ok(())
            }
            Self::Json(_) => JsonRenderer::render_resources(template),
        }
    }
}
