//! Build command - generates the site

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use pubstatic_generator::{BuildStats, Pipeline};

use super::load_config;

/// Run the build command.
///
/// Rebuilds every stale unit and prints per-stage counts.
pub fn run(config_path: &Path) -> Result<BuildStats> {
    tracing::info!(?config_path, "Starting build");

    let config = load_config(config_path)?;
    let output = config.paths.build.clone();

    let pipeline = Pipeline::new(config).wrap_err("Failed to set up build")?;
    let stats = pipeline.build().wrap_err("Build failed")?;

    println!();
    println!("  Build completed successfully!");
    println!();
    for (stage, counts) in &stats.stages {
        println!(
            "  {:<8} {:>4} written {:>4} up to date",
            stage.name(),
            counts.written,
            counts.skipped
        );
    }
    println!();
    println!("  Duration: {:.2}s", stats.duration_ms as f64 / 1000.0);
    println!("  Output:   {}", output.display());
    println!();

    Ok(stats)
}
