//! pubstatic CLI Library
//!
//! Command implementations behind the `pubstatic` binary.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, clean, page, post)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pubstatic::cmd;
//!
//! cmd::build::run(Path::new("config.toml")).unwrap();
//! ```

pub mod cmd;

pub use pubstatic_core::Config;
pub use pubstatic_generator::{BuildStats, Pipeline};

/// Initialize tracing with the specified verbosity level.
///
/// `RUST_LOG` directives are honored on top of the level.
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
