//! Integration tests for game-studio CLI
//!
//! These tests spawn the actual binary inside a temporary project directory
//! and test end-to-end behavior.

mod cli_tests;
mod config_command;
mod stack_commands;
mod synth_command;

use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// The binary with colors off and no environment overrides leaking in.
pub fn game_studio(project: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("game-studio"));
    cmd.current_dir(project)
        .env("NO_COLOR", "1")
        .env_remove("GAME_STUDIO_CONFIG")
        .env_remove("GAME_STUDIO_REGION")
        .env_remove("GAME_STUDIO_ACCOUNT")
        .env_remove("RUST_LOG");
    cmd
}

/// A temp project directory with the default boot script in place.
#[allow(clippy::expect_used)]
pub fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let scripts = dir.path().join("p4d-files");
    std::fs::create_dir_all(&scripts).expect("mkdir");
    std::fs::write(scripts.join("configure-p4d.sh"), "echo configuring p4d\n").expect("write");
    dir
}
