//! pubstatic CLI
//!
//! Static website generator for Markdown pages and blog posts.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for pubstatic.
#[derive(Parser)]
#[command(
    name = "pubstatic",
    version,
    about = "A static website generator for Markdown pages and blog posts"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Build the site, skipping units that are up to date
    Build,
    /// Remove the build directory
    Clean,
    /// Create a new page
    Page {
        /// Page name; may contain folders (e.g., docs/setup)
        name: String,
        /// Overwrite an existing page
        #[arg(short, long)]
        force: bool,
    },
    /// Create a new blog post
    Post {
        /// Post title
        name: String,
        /// Overwrite instead of adding a numeric suffix
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    pubstatic::init_tracing(cli.verbose);

    run(cli)
}

/// Dispatch a parsed command line.
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build => {
            pubstatic::cmd::build::run(&cli.config)?;
        }
        Commands::Clean => {
            pubstatic::cmd::clean::run(&cli.config)?;
        }
        Commands::Page { name, force } => {
            pubstatic::cmd::new::page(&cli.config, &name, force)?;
        }
        Commands::Post { name, force } => {
            pubstatic::cmd::new::post(&cli.config, &name, force)?;
        }
    }

    Ok(())
}
