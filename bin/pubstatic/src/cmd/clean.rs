//! Clean command - removes generated output

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use pubstatic_generator::clean;

use super::load_config;

/// Run the clean command.
///
/// Source files and the build cache location are left untouched; a cache
/// pointing at missing output is invalidated on the next build.
pub fn run(config_path: &Path) -> Result<bool> {
    let config = load_config(config_path)?;
    let build = &config.paths.build;

    let removed = clean(build)
        .wrap_err_with(|| format!("Failed to remove build directory: {}", build.display()))?;

    if removed {
        println!("Removed: {}", build.display());
    } else {
        println!("Nothing to clean: {}", build.display());
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_clean_command() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[paths]\nbuild = \"out\"\n").unwrap();
        fs::create_dir_all(dir.path().join("out/css")).unwrap();
        fs::write(dir.path().join("out/css/site.css"), "body {}").unwrap();

        assert!(run(&config_path).unwrap());
        assert!(!dir.path().join("out").exists());
        assert!(!run(&config_path).unwrap());
    }
}
