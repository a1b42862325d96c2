//! Application service: construct, synthesize and write the stack.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{AssemblyWriter, BootScriptSource};
use crate::domain::assembly::{MANIFEST_FILE, Manifest, template_digest, template_file_name};
use crate::domain::compute::UserData;
use crate::domain::config::StudioConfig;
use crate::domain::construct::Scope;
use crate::domain::stack::GameStudioStack;
use crate::domain::template::Template;

/// Per-invocation overrides of the configured environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynthOptions<'a> {
    pub region: Option<&'a str>,
    pub account: Option<&'a str>,
}

/// A synthesized stack with its rendered template.
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub stack: GameStudioStack,
    pub template: Template,
    /// Pretty-printed template JSON, exactly as written to disk.
    pub json: String,
    /// SHA-256 of `json`.
    pub digest: String,
}

/// Where `write_assembly` put things.
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    pub dir: PathBuf,
    pub template_path: PathBuf,
    pub manifest_path: PathBuf,
    pub digest: String,
}

/// Construct the stack in `scope`, loading boot commands from `boot_script`.
///
/// # Errors
///
/// Returns an error if the boot script is missing or not UTF-8, or the
/// stack cannot be constructed in `scope`.
pub fn construct_stack(
    scope: &Scope,
    id: &str,
    boot_script: &Path,
    source: &impl BootScriptSource,
) -> Result<GameStudioStack> {
    let script = source.read_boot_script(boot_script)?;
    tracing::debug!(path = %boot_script.display(), bytes = script.len(), "boot script loaded");

    let mut user_data = UserData::for_linux();
    user_data.add_commands(&script);

    let stack = GameStudioStack::new(scope, id, user_data)
        .with_context(|| format!("cannot construct stack '{id}'"))?;
    tracing::info!(stack = id, env = %scope.env().uri(), "stack constructed");
    Ok(stack)
}

/// Render a constructed stack to a template.
///
/// # Errors
///
/// Returns an error if rendering fails or the template has dangling
/// references.
pub fn synthesize(stack: GameStudioStack) -> Result<Synthesized> {
    let _span = tracing::info_span!("synth", stack = stack.name()).entered();

    let template = stack
        .synth()
        .with_context(|| format!("cannot synthesize stack '{}'", stack.name()))?;
    let json = template
        .to_json_pretty()
        .context("cannot serialize template")?;
    let digest = template_digest(&json);
    tracing::info!(
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        %digest,
        "template synthesized"
    );

    Ok(Synthesized {
        stack,
        template,
        json,
        digest,
    })
}

/// Construct and synthesize the stack described by `config`.
///
/// # Errors
///
/// See [`construct_stack`] and [`synthesize`].
pub fn synthesize_from_config(
    config: &StudioConfig,
    options: SynthOptions<'_>,
    source: &impl BootScriptSource,
) -> Result<Synthesized> {
    let scope = Scope::new(config.environment(options.region, options.account)?);
    let stack = construct_stack(&scope, &config.stack.name, &config.boot_script, source)?;
    synthesize(stack)
}

/// Write the template and manifest to `dir`.
///
/// # Errors
///
/// Returns an error if serializing the manifest or writing fails.
pub fn write_assembly(
    writer: &impl AssemblyWriter,
    dir: &Path,
    synthesized: &Synthesized,
) -> Result<AssemblyReport> {
    let name = synthesized.stack.name();
    let manifest = Manifest::for_stack(name, synthesized.stack.env());
    let mut manifest_json =
        serde_json::to_string_pretty(&manifest).context("cannot serialize manifest")?;
    manifest_json.push('\n');

    let files = [
        (template_file_name(name), synthesized.json.clone()),
        (MANIFEST_FILE.to_string(), manifest_json),
    ];
    let written = writer.write_assembly(dir, &files)?;
    tracing::info!(dir = %dir.display(), files = written.len(), "cloud assembly written");

    Ok(AssemblyReport {
        dir: dir.to_path_buf(),
        template_path: dir.join(&files[0].0),
        manifest_path: dir.join(&files[1].0),
        digest: synthesized.digest.clone(),
    })
}
