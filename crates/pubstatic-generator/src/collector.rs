//! Source collection.
//!
//! Walks the asset, page and post roots and instantiates content units.
//! Hidden files and directories are skipped; a missing root is empty.

use std::path::{Path, PathBuf};

use pubstatic_core::{AssetFile, BodyRenderer, Config, PageFile, PostFile, Result};
use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions accepted as post sources.
const POST_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Relative paths of every visible file under `root`, sorted.
pub fn source_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        debug!(dir = %root.display(), "source directory does not exist, skipping");
        return Vec::new();
    }

    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_string_lossy().as_ref()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();

    files.sort();
    files
}

/// All assets.
pub fn collect_assets(config: &Config) -> Result<Vec<AssetFile>> {
    source_files(&config.paths.assets)
        .into_iter()
        .map(|rel| AssetFile::open(config, rel))
        .collect()
}

/// All pages, parsed in parallel.
pub fn collect_pages(config: &Config, renderer: &dyn BodyRenderer) -> Result<Vec<PageFile>> {
    source_files(&config.paths.pages)
        .par_iter()
        .map(|rel| PageFile::open(config, rel, renderer))
        .collect()
}

/// All Markdown posts, parsed in parallel.
pub fn collect_posts(config: &Config, renderer: &dyn BodyRenderer) -> Result<Vec<PostFile>> {
    source_files(&config.paths.posts)
        .into_iter()
        .filter(|rel| {
            rel.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| POST_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .collect::<Vec<_>>()
        .par_iter()
        .map(|rel| PostFile::open(config, rel, renderer))
        .collect()
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pubstatic_core::{ContentUnit, CoreError, Parseable};
    use pubstatic_parser::MarkdownRenderer;

    use super::*;

    fn site() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::default().resolve(dir.path()).expect("resolve");
        (dir, config)
    }

    fn write(path: PathBuf, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_source_files_skips_hidden() {
        let (_dir, config) = site();
        let root = &config.paths.assets;
        write(root.join("css/site.css"), "");
        write(root.join(".git/config"), "");
        write(root.join("img/.DS_Store"), "");
        write(root.join("robots.txt"), "");

        assert_eq!(
            source_files(root),
            vec![PathBuf::from("css/site.css"), PathBuf::from("robots.txt")]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let (_dir, config) = site();
        assert!(collect_assets(&config).unwrap().is_empty());
    }

    #[test]
    fn test_collect_posts_filters_extensions() {
        let (_dir, config) = site();
        write(config.paths.posts.join("2023-01-02-first.md"), "title: First\n\nHi");
        write(config.paths.posts.join("notes.txt"), "not a post");
        write(config.paths.posts.join("2023/second.MARKDOWN"), "# Second");

        let posts = collect_posts(&config, &MarkdownRenderer::default()).unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.metadata().title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert_eq!(posts[0].source().rel_path(), Path::new("2023/second.MARKDOWN"));
    }

    #[test]
    fn test_collect_pages_reports_bad_file() {
        let (_dir, config) = site();
        fs::create_dir_all(&config.paths.pages).unwrap();
        fs::write(config.paths.pages.join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();

        let result = collect_pages(&config, &MarkdownRenderer::default());
        assert!(matches!(result, Err(CoreError::Parse { .. })));
    }
}
