//! Command implementations

pub mod check;
pub mod config;
pub mod outputs;
pub mod resources;
pub mod synth;
pub mod version;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{config_service, synth as synth_service};

/// Target environment overrides shared by stack commands.
#[derive(Args, Debug, Default)]
pub struct StackArgs {
    /// Target region, overriding `stack.region`
    #[arg(long, env = "GAME_STUDIO_REGION")]
    pub region: Option<String>,

    /// Target account, overriding `stack.account`
    #[arg(long, env = "GAME_STUDIO_ACCOUNT")]
    pub account: Option<String>,
}

impl StackArgs {
    /// Load config and synthesize the stack with these overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if loading config, reading the boot script or
    /// synthesis fails.
    pub fn synthesize(&self, app: &AppContext) -> Result<synth_service::Synthesized> {
        let config = config_service::load_config(&app.config_store)?;
        synth_service::synthesize_from_config(
            &config,
            synth_service::SynthOptions {
                region: self.region.as_deref(),
                account: self.account.as_deref(),
            },
            &app.fs,
        )
    }
}
