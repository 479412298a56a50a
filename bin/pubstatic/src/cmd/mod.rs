//! CLI command implementations.

pub mod build;
pub mod clean;
pub mod new;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use pubstatic_core::Config;

/// Load the site configuration, applying `PUBSTATIC__*` environment overrides.
pub fn load_config(config_path: &Path) -> Result<Config> {
    let config = Config::load_with_env(config_path)
        .wrap_err_with(|| format!("Failed to load configuration: {}", config_path.display()))?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
