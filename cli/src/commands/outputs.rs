//! `game-studio outputs`

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::StackArgs;

/// Run the outputs command.
///
/// # Errors
///
/// Returns an error if the stack cannot be synthesized.
pub fn run(app: &AppContext, args: &StackArgs) -> Result<ExitCode> {
    let synthesized = args.synthesize(app)?;
    app.renderer().render_outputs(synthesized.stack.outputs())?;
    Ok(ExitCode::SUCCESS)
}
