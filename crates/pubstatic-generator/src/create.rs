//! New content creation.
//!
//! Pages and posts are created from prototypes: `default-page.md` and
//! `default-post.md` in the prototypes directory, or built-in texts when
//! those are missing. `{title}` and `{created}` are substituted.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use pubstatic_core::{
    Config, CoreError, Result,
    slug::{slugify, slugify_path},
};
use tracing::{debug, info};

/// Name used when a post name has no usable characters.
pub const UNTITLED: &str = "untitled";

const DEFAULT_PAGE_PROTOTYPE: &str = "title: {title}\ncreated: {created}\n\n# {title}\n";

const DEFAULT_POST_PROTOTYPE: &str = "title: {title}\ncreated: {created}\n\n";

/// Create a page named `name`; it may contain `/` or `\` separated folders.
///
/// Fails with `AlreadyExists` when the file exists and `force` is not set.
pub fn new_page(config: &Config, name: &str, force: bool) -> Result<PathBuf> {
    new_page_at(config, name, force, Local::now().naive_local())
}

/// [`new_page`] with an explicit creation time.
pub fn new_page_at(config: &Config, name: &str, force: bool, now: NaiveDateTime) -> Result<PathBuf> {
    let slug = match slugify_path(name) {
        slug if slug.is_empty() => UNTITLED.to_string(),
        slug => slug,
    };
    let path = config.paths.pages.join(format!("{slug}.md"));

    if path.exists() && !force {
        return Err(CoreError::already_exists(path));
    }

    let text = fill_prototype(config, "default-page", DEFAULT_PAGE_PROTOTYPE, name, now)?;
    write_new(&path, &text)?;
    info!(path = %path.display(), "created page");
    Ok(path)
}

/// Create a post named `name` under a unique, date-prefixed file name.
///
/// Existing files get a numeric suffix (`-2`, `-3`, ...) unless `force` is
/// set, in which case the unsuffixed file is overwritten.
pub fn new_post(config: &Config, name: &str, force: bool) -> Result<PathBuf> {
    new_post_at(config, name, force, Local::now().naive_local())
}

/// [`new_post`] with an explicit creation time.
pub fn new_post_at(config: &Config, name: &str, force: bool, now: NaiveDateTime) -> Result<PathBuf> {
    let slug = match slugify(name) {
        slug if slug.is_empty() => UNTITLED.to_string(),
        slug => slug,
    };
    let prefix = now.format("%Y%m%d");

    let path = (1..)
        .map(|count| {
            config
                .paths
                .posts
                .join(format!("{prefix}-{slug}{}.md", suffix(count)))
        })
        .find(|candidate| force || !candidate.exists())
        .ok_or_else(|| CoreError::Collision {
            path: config.paths.posts.join(&slug),
        })?;

    let text = fill_prototype(config, "default-post", DEFAULT_POST_PROTOTYPE, name, now)?;
    write_new(&path, &text)?;
    info!(path = %path.display(), "created post");
    Ok(path)
}

/// File name suffix for the `count`-th candidate.
fn suffix(count: u32) -> String {
    if count <= 1 {
        String::new()
    } else {
        format!("-{count}")
    }
}

fn fill_prototype(
    config: &Config,
    prototype: &str,
    fallback: &str,
    title: &str,
    now: NaiveDateTime,
) -> Result<String> {
    let path = config.paths.prototypes.join(format!("{prototype}.md"));
    let text = if path.is_file() {
        debug!(path = %path.display(), "using prototype");
        fs::read_to_string(&path).map_err(|e| CoreError::parse(&path, e.to_string()))?
    } else {
        fallback.to_string()
    };

    let created = now.format(config.primary_time_format()).to_string();
    Ok(substitute(&text, &[("{title}", title), ("{created}", &created)]))
}

/// Replace each placeholder in one left-to-right scan. Inserted values are
/// not scanned again, so a title may contain `{created}` literally.
fn substitute(text: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        match vars.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                out.push('{');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn write_new(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
