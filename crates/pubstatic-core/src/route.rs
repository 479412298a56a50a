//! Destination routing.
//!
//! Every function here is pure: the output location of a content unit is
//! derived from its kind, its source-relative path, its resolved creation
//! date and configuration only, so it can always be recomputed without
//! consulting the build cache.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::SUFFIX_PLACEHOLDER;

/// Characters stripped from the front of a post's base name.
const POST_PREFIX_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '-', '_',
];

/// Route an asset: `.less` sources are emitted as `.css`.
pub fn asset_destination(rel_path: &Path) -> PathBuf {
    if has_extension(rel_path, &["less"]) {
        rel_path.with_extension("css")
    } else {
        rel_path.to_path_buf()
    }
}

/// Route a page: Markdown sources are emitted as `.html`.
pub fn page_destination(rel_path: &Path) -> PathBuf {
    if has_extension(rel_path, &["md", "markdown"]) {
        rel_path.with_extension("html")
    } else {
        rel_path.to_path_buf()
    }
}

/// Route a post through the configured location pattern.
///
/// Supported placeholders are `{year}`, `{month}`, `{day}`, `{name}` and
/// `{suffix}`.
pub fn post_destination(
    rel_path: &Path,
    created: DateTime<Utc>,
    location: &str,
    suffix: &str,
) -> PathBuf {
    let file_name = rel_path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    let rel = location
        .replace("{year}", &created.format("%Y").to_string())
        .replace("{month}", &created.format("%m").to_string())
        .replace("{day}", &created.format("%d").to_string())
        .replace("{name}", post_name(&file_name))
        .replace(SUFFIX_PLACEHOLDER, suffix);

    PathBuf::from(rel.trim_start_matches('/'))
}

/// Derive a post name from its source file name.
///
/// The extension and any leading date digits, dashes or underscores are
/// removed: `2023-04-01-hello-world.md` gives `hello-world`. A name made of
/// digits only is kept whole.
pub fn post_name(file_name: &str) -> &str {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    match stem.trim_start_matches(POST_PREFIX_CHARS) {
        "" => stem,
        name => name,
    }
}

/// Join a root URL (ending with `/`) and a relative destination.
pub fn url_for(root: &str, rel_dest: &Path) -> String {
    let rel = rel_dest
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("{root}{rel}")
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn april_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_asset_destination() {
        assert_eq!(
            asset_destination(Path::new("styles/site.less")),
            PathBuf::from("styles/site.css")
        );
        assert_eq!(
            asset_destination(Path::new("js/app.js")),
            PathBuf::from("js/app.js")
        );
        assert_eq!(
            asset_destination(Path::new("img/logo.png")),
            PathBuf::from("img/logo.png")
        );
    }

    #[test]
    fn test_page_destination() {
        assert_eq!(
            page_destination(Path::new("about.md")),
            PathBuf::from("about.html")
        );
        assert_eq!(
            page_destination(Path::new("docs/guide.MARKDOWN")),
            PathBuf::from("docs/guide.html")
        );
        assert_eq!(
            page_destination(Path::new("raw.html")),
            PathBuf::from("raw.html")
        );
    }

    #[test]
    fn test_post_destination() {
        let dest = post_destination(
            Path::new("2023-04-01-hello-world.md"),
            april_first(),
            "{year}/{month}/{name}{suffix}.html",
            "",
        );
        assert_eq!(dest, PathBuf::from("2023/04/hello-world.html"));
    }

    #[test]
    fn test_post_destination_with_day_and_suffix() {
        let dest = post_destination(
            Path::new("20230401_hello.md"),
            april_first(),
            "/blog/{year}/{month}/{day}/{name}{suffix}.html",
            "-2",
        );
        assert_eq!(dest, PathBuf::from("blog/2023/04/01/hello-2.html"));
    }

    #[test]
    fn test_post_destination_is_deterministic() {
        let location = "{year}/{month}/{day}/{name}{suffix}.html";
        let rel = Path::new("posts/2024-12-31-year-end.md");
        let first = post_destination(rel, april_first(), location, "");
        let second = post_destination(rel, april_first(), location, "");
        assert_eq!(first, second);
        assert!(!first.to_string_lossy().contains("2024-12-31"));
    }

    #[test]
    fn test_post_name() {
        assert_eq!(post_name("2023-04-01-hello-world.md"), "hello-world");
        assert_eq!(post_name("20230401_-_notes.markdown"), "notes");
        assert_eq!(post_name("plain.md"), "plain");
        assert_eq!(post_name("2023.md"), "2023");
        assert_eq!(post_name("2023-01-01-v1.2.md"), "v1.2");
    }

    #[test]
    fn test_url_for() {
        assert_eq!(
            url_for("https://example.com/", Path::new("2023/04/hello.html")),
            "https://example.com/2023/04/hello.html"
        );
        assert_eq!(url_for("/", Path::new("about.html")), "/about.html");
    }
}
