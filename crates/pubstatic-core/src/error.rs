//! Error types for the pubstatic core library.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types for pubstatic.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration loading or validation error.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced source file or directory does not exist.
    #[error("Not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A parseable source file could not be read as text.
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A page with the same name already exists.
    #[error("Already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// Two content units claim the same output location.
    #[error("Collision at {}", path.display())]
    Collision { path: PathBuf },

    /// Markdown, template or stylesheet backend failure.
    #[error("Render error in {}: {message}", path.display())]
    Render { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File plus environment configuration could not be merged.
    #[error("Layered configuration error: {0}")]
    Layered(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source.
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a new parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new already-exists error.
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Create a new render error.
    pub fn render(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Render {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("content.time_formats must list at least one format");
        assert_eq!(
            err.to_string(),
            "Configuration error: content.time_formats must list at least one format"
        );
    }

    #[test]
    fn test_not_found_error() {
        let err = CoreError::not_found("pages/about.md");
        assert_eq!(err.to_string(), "Not found: pages/about.md");
    }

    #[test]
    fn test_render_error() {
        let err = CoreError::render("assets/site.less", "lessc exited with 1");
        assert!(err.to_string().contains("assets/site.less"));
        assert!(err.to_string().contains("lessc exited with 1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
