//! Environment-variable overrides for CLI flags.
//!
//! IMPORTANT: These tests mutate process env vars; `#[serial]` keeps them
//! from racing each other.

#![allow(clippy::expect_used, clippy::unwrap_used, unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use serial_test::serial;

use game_studio::cli::{Cli, Command};

const VARS: &[&str] = &[
    "GAME_STUDIO_CONFIG",
    "GAME_STUDIO_REGION",
    "GAME_STUDIO_ACCOUNT",
    "NO_COLOR",
];

/// Runs `f` with `vars` set, clearing every override afterwards.
fn with_env(vars: &[(&str, &str)], f: impl FnOnce()) {
    for name in VARS {
        // SAFETY: callers are #[serial]; no other thread reads the env.
        unsafe { std::env::remove_var(name) };
    }
    for (name, value) in vars {
        // SAFETY: as above.
        unsafe { std::env::set_var(name, value) };
    }
    f();
    for name in VARS {
        // SAFETY: as above.
        unsafe { std::env::remove_var(name) };
    }
}

#[test]
#[serial]
fn test_region_env_fills_flag() {
    with_env(&[("GAME_STUDIO_REGION", "us-west-1")], || {
        let cli = Cli::try_parse_from(["game-studio", "check"]).expect("parse");
        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.region.as_deref(), Some("us-west-1"));
        assert_eq!(args.account, None);
    });
}

#[test]
#[serial]
fn test_region_flag_beats_env() {
    with_env(&[("GAME_STUDIO_REGION", "us-west-1")], || {
        let cli = Cli::try_parse_from(["game-studio", "synth", "--region", "us-east-2"])
            .expect("parse");
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.stack.region.as_deref(), Some("us-east-2"));
    });
}

#[test]
#[serial]
fn test_config_env_sets_global_path() {
    with_env(&[("GAME_STUDIO_CONFIG", "ci/studio.yaml")], || {
        let cli = Cli::try_parse_from(["game-studio", "resources"]).expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("ci/studio.yaml")));
    });
}

#[test]
#[serial]
fn test_no_overrides_by_default() {
    with_env(&[], || {
        let cli = Cli::try_parse_from(["game-studio", "outputs"]).expect("parse");
        assert_eq!(cli.config, None);
        let Command::Outputs(args) = cli.command else {
            panic!("expected outputs");
        };
        assert_eq!(args.region, None);
    });
}

#[test]
#[serial]
fn test_no_color_env_one_disables_color() {
    with_env(&[("NO_COLOR", "1")], || {
        let cli = Cli::try_parse_from(["game-studio", "version"]).expect("parse");
        assert!(cli.no_color);
    });
}

#[test]
#[serial]
fn test_no_color_env_falsey_keeps_color() {
    with_env(&[("NO_COLOR", "0")], || {
        let cli = Cli::try_parse_from(["game-studio", "version"]).expect("parse");
        assert!(!cli.no_color);
    });
}
