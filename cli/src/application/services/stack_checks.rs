//! Application service: structural checks over a synthesized template.

use crate::domain::checks::StackChecks;
use crate::domain::template::Template;

/// Run every check against `template`, logging each failure.
#[must_use]
pub fn run_checks(template: &Template) -> StackChecks {
    let checks = StackChecks::run(template);
    for failure in checks.failures() {
        tracing::warn!(check = failure.name, detail = %failure.detail, "check failed");
    }
    tracing::info!(
        total = checks.results.len(),
        passed = checks.all_passed(),
        "stack checks complete"
    );
    checks
}
