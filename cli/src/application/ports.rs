//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::config::StudioConfig;

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading and persisting the project configuration.
pub trait ConfigStore {
    /// Load the configuration, returning defaults if no file exists.
    fn load(&self) -> Result<StudioConfig>;
    /// Persist the configuration.
    fn save(&self, config: &StudioConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Abstracts reading the instance boot script.
pub trait BootScriptSource {
    /// Read the script at `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::domain::BootScriptError`] if the file is missing
    /// or not valid UTF-8.
    fn read_boot_script(&self, path: &Path) -> Result<String>;
}

/// Abstracts writing a cloud assembly directory.
pub trait AssemblyWriter {
    /// Write each `(file name, content)` pair under `dir`, creating it if
    /// needed. Returns the paths written, in order.
    fn write_assembly(&self, dir: &Path, files: &[(String, String)]) -> Result<Vec<PathBuf>>;
}
