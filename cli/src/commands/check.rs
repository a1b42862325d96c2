//! `game-studio check`: structural checks over the synthesized template.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::stack_checks;
use crate::commands::StackArgs;

/// Run the check command. Exits 1 when any check fails.
///
/// # Errors
///
/// Returns an error if the stack cannot be synthesized.
pub fn run(app: &AppContext, args: &StackArgs) -> Result<ExitCode> {
    let synthesized = args.synthesize(app)?;
    let checks = stack_checks::run_checks(&synthesized.template);
    app.renderer()
        .render_checks(synthesized.stack.name(), &checks)?;

    Ok(if checks.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
