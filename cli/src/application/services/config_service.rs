//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::StudioConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<StudioConfig> {
    let config = store.load()?;
    tracing::debug!(stack = %config.stack.name, "configuration loaded");
    Ok(config)
}

/// Save configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &StudioConfig) -> Result<()> {
    store.save(config)?;
    tracing::debug!("configuration saved");
    Ok(())
}

/// Validate, apply and persist one setting. Returns the updated config.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or persisting fails.
/// Nothing is written when validation fails.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<StudioConfig> {
    let mut config = load_config(store)?;
    config.set(key, value)?;
    save_config(store, &config)?;
    tracing::info!(key, value, "setting updated");
    Ok(config)
}
