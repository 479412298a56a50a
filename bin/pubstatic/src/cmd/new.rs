//! Page and post commands - create new content from prototypes

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use pubstatic_generator::{new_page, new_post};

use super::load_config;

/// Run the page command.
pub fn page(config_path: &Path, name: &str, force: bool) -> Result<PathBuf> {
    tracing::info!(name, force, "Creating new page");

    let config = load_config(config_path)?;
    let path = new_page(&config, name, force).wrap_err("Failed to create page")?;

    println!("Created: {}", path.display());
    Ok(path)
}

/// Run the post command.
pub fn post(config_path: &Path, name: &str, force: bool) -> Result<PathBuf> {
    tracing::info!(name, force, "Creating new post");

    let config = load_config(config_path)?;
    let path = new_post(&config, name, force).wrap_err("Failed to create post")?;

    println!("Created: {}", path.display());
    Ok(path)
}
