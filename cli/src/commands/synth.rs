//! `game-studio synth`: write the cloud assembly.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{config_service, synth};
use crate::commands::StackArgs;

/// Arguments for the synth command.
#[derive(Args, Debug, Default)]
pub struct SynthArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Output directory, overriding `output_dir`
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Print the template to stdout instead of writing the assembly
    #[arg(long)]
    pub stdout: bool,
}

/// Run the synth command.
///
/// # Errors
///
/// Returns an error if synthesis or writing the assembly fails.
pub fn run(app: &AppContext, args: &SynthArgs) -> Result<ExitCode> {
    let synthesized = args.stack.synthesize(app)?;

    if args.stdout {
        print!("{}", synthesized.json);
        return Ok(ExitCode::SUCCESS);
    }

    let out = match &args.out {
        Some(dir) => dir.clone(),
        None => config_service::load_config(&app.config_store)?.output_dir,
    };
    let report = synth::write_assembly(&app.fs, &out, &synthesized)?;
    app.renderer()
        .render_synth(synthesized.stack.name(), &synthesized.template, &report)?;
    Ok(ExitCode::SUCCESS)
}
