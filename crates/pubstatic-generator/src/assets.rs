//! Asset processing.
//!
//! Assets are copied into the build tree unchanged, except LESS sources,
//! which go through the configured external compiler.

use std::{fs, path::Path, process::Command};

use thiserror::Error;
use tracing::{debug, warn};

/// Asset processing errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The compiler command line is empty.
    #[error("empty LESS compiler command")]
    EmptyCommand,

    /// The compiler could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler exited with an error.
    #[error("LESS compiler failed on {path} ({status}): {stderr}")]
    Compile {
        path: String,
        status: String,
        stderr: String,
    },
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copy `source` to `dest`, creating parent directories.
pub fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    ensure_parent(dest)?;
    fs::copy(source, dest)?;
    debug!(src = %source.display(), dest = %dest.display(), "copied asset");
    Ok(())
}

/// Compile a LESS file to CSS.
///
/// `command` is split on whitespace; `{source}` and `{dest}` are substituted
/// in every argument. Without a command the source is copied as is.
pub fn compile_less(command: Option<&str>, source: &Path, dest: &Path) -> Result<()> {
    let Some(command) = command else {
        warn!(src = %source.display(), "no LESS compiler configured, copying source");
        return copy_file(source, dest);
    };

    ensure_parent(dest)?;

    let source_str = source.to_string_lossy();
    let dest_str = dest.to_string_lossy();
    let mut args = command.split_whitespace().map(|arg| {
        arg.replace("{source}", &source_str)
            .replace("{dest}", &dest_str)
    });
    let program = args.next().ok_or(AssetError::EmptyCommand)?;

    let output = Command::new(&program)
        .args(args)
        .output()
        .map_err(|source| AssetError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(AssetError::Compile {
            path: source_str.into_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    debug!(src = %source.display(), dest = %dest.display(), "compiled LESS");
    Ok(())
}

/// Write text output, creating parent directories.
pub fn write_output(dest: &Path, contents: &str) -> Result<()> {
    ensure_parent(dest)?;
    fs::write(dest, contents)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_file_creates_dirs() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let src = dir.path().join("logo.svg");
        fs::write(&src, "<svg/>").unwrap();
        let dest = dir.path().join("www/img/logo.svg");

        copy_file(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "<svg/>");
    }

    #[test]
    fn test_less_without_command_copies() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let src = dir.path().join("site.less");
        fs::write(&src, "@c: red;").unwrap();
        let dest = dir.path().join("out/site.css");

        compile_less(None, &src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "@c: red;");
    }

    #[cfg(unix)]
    #[test]
    fn test_less_command_placeholders() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let src = dir.path().join("site.less");
        fs::write(&src, "body {}").unwrap();
        let dest = dir.path().join("out/site.css");

        compile_less(Some("cp {source} {dest}"), &src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "body {}");
    }

    #[cfg(unix)]
    #[test]
    fn test_less_command_failure() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let src = dir.path().join("missing.less");
        let dest = dir.path().join("site.css");

        let result = compile_less(Some("cp {source} {dest}"), &src, &dest);
        assert!(matches!(result, Err(AssetError::Compile { .. })));
    }

    #[test]
    fn test_less_command_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let src = dir.path().join("a.less");
        let result = compile_less(
            Some("pubstatic-no-such-compiler {source}"),
            &src,
            &dir.path().join("a.css"),
        );
        assert!(matches!(result, Err(AssetError::Spawn { .. })));
    }

    #[test]
    fn test_empty_command() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let result = compile_less(Some("   "), &dir.path().join("a.less"), &dir.path().join("a.css"));
        assert!(matches!(result, Err(AssetError::EmptyCommand)));
    }
}
