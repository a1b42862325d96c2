//! Human-readable terminal renderer.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize as _;

use crate::application::services::synth::AssemblyReport;
use crate::domain::checks::StackChecks;
use crate::domain::config::StudioConfig;
use crate::domain::stack::StackOutput;
use crate::domain::template::Template;
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        println!("game-studio {version}");
    }

    /// Render the current project configuration.
    pub fn render_config(&self, config: &StudioConfig, path: &Path) {
        let unset = "(not set)";
        println!();
        println!(
            "  {}",
            format!("Configuration ({})", path.display()).style(self.ctx.styles.header)
        );
        println!();
        println!("  {:<20} {}", "stack.name:", config.stack.name);
        println!(
            "  {:<20} {}",
            "stack.account:",
            config.stack.account.as_deref().unwrap_or(unset)
        );
        println!(
            "  {:<20} {}",
            "stack.region:",
            config.stack.region.as_deref().unwrap_or(unset)
        );
        println!("  {:<20} {}", "boot_script:", config.boot_script.display());
        println!("  {:<20} {}", "output_dir:", config.output_dir.display());
        println!();
        println!("  {}", "Environment:".style(self.ctx.styles.bold));
        for var in ["GAME_STUDIO_CONFIG", "RUST_LOG", "NO_COLOR"] {
            println!(
                "    {:<20} {}",
                format!("{var}:"),
                std::env::var(var).unwrap_or_else(|_| unset.to_string())
            );
        }
        println!();
    }

    /// Render the result of `synth`.
    pub fn render_synth(&self, stack: &str, template: &Template, report: &AssemblyReport) {
        self.ctx.success(&format!(
            "Synthesized {stack} ({} resources, {} outputs)",
            template.resources.len(),
            template.outputs.len()
        ));
        self.ctx.kv("Template:", &report.template_path.display().to_string());
        self.ctx.kv("Manifest:", &report.manifest_path.display().to_string());
        self.ctx.kv("SHA-256: ", &report.digest);
    }

    /// Render check results, one line per check.
    pub fn render_checks(&self, stack: &str, checks: &StackChecks) {
        self.ctx.header(&format!("Checks for {stack}"));
        for result in &checks.results {
            let line = format!("{:<18} {}", result.name, result.detail);
            if result.passed {
                self.ctx.success(&line);
            } else {
                self.ctx.failure(&line);
            }
        }
        let failed = checks.failures().count();
        if failed > 0 && !self.ctx.quiet {
            println!();
            self.ctx.warn(&format!("{failed} of {} checks failed", checks.results.len()));
        }
    }

    /// Render exported outputs with their value expressions.
    ///
    /// # Errors
    ///
    /// Returns an error if an expression cannot be serialized.
    pub fn render_outputs(&self, outputs: &[StackOutput]) -> Result<()> {
        for output in outputs {
            let value = serde_json::to_string(&output.value)
                .with_context(|| format!("cannot render output {}", output.name))?;
            println!("  {:<14} {value}", output.name.style(self.ctx.styles.bold));
            if !self.ctx.quiet {
                println!("  {:<14} {}", "", output.description.style(self.ctx.styles.dim));
            }
        }
        Ok(())
    }

    /// Render resources as `<logical id>  <type>` rows.
    pub fn render_resources(&self, template: &Template) {
        let width = template.resources.keys().map(String::len).max().unwrap_or(0);
        for (id, resource) in &template.resources {
            println!(
                "  {id:<width$}  {}",
                resource.kind.style(self.ctx.styles.resource_type)
            );
        }
    }
}
