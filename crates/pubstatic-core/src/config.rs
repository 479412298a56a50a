//! Site configuration management.
//!
//! A [`Config`] is loaded from `config.toml` (or a YAML file), then resolved
//! against the directory it was loaded from. The build pipeline only ever
//! sees resolved configuration: absolute paths, normalized URLs and a post
//! location that carries a `{suffix}` placeholder.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// Placeholder used for post disambiguation suffixes.
pub const SUFFIX_PLACEHOLDER: &str = "{suffix}";

/// Main configuration structure for pubstatic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Site-wide settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Source and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Content processing settings.
    #[serde(default)]
    pub content: ContentConfig,

    /// Asset processing settings.
    #[serde(default)]
    pub assets: AssetsConfig,
}

/// Site-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Default author for pages and posts.
    #[serde(default)]
    pub author: String,

    /// Absolute root URL (e.g., "https://example.com/").
    #[serde(default = "default_root_url")]
    pub root_url: String,

    /// Site-relative root URL (e.g., "/").
    #[serde(default = "default_rel_root_url")]
    pub rel_root_url: String,

    /// Base URL of the site's source repository; empty disables source links.
    #[serde(default)]
    pub source_url: String,

    /// Tags assigned to content that declares none.
    #[serde(default = "default_tags")]
    pub default_tags: Vec<String>,
}

/// Source and output directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_pages_path")]
    pub pages: PathBuf,

    #[serde(default = "default_posts_path")]
    pub posts: PathBuf,

    #[serde(default = "default_assets_path")]
    pub assets: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "default_build_path")]
    pub build: PathBuf,

    #[serde(default = "default_templates_path")]
    pub templates: PathBuf,

    /// Prototypes used by `page` and `post` creation.
    #[serde(default = "default_prototypes_path")]
    pub prototypes: PathBuf,

    /// Build cache file.
    #[serde(default = "default_cache_path")]
    pub cache: PathBuf,
}

/// Content processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Default template for pages.
    #[serde(default = "default_page_template")]
    pub page_template: String,

    /// Default template for posts.
    #[serde(default = "default_post_template")]
    pub post_template: String,

    /// Accepted timestamp formats, tried in order. A single string is accepted.
    #[serde(
        default = "default_time_formats",
        alias = "time_format",
        deserialize_with = "one_or_many"
    )]
    pub time_formats: Vec<String>,

    /// Output path pattern for posts.
    #[serde(default = "default_post_location")]
    pub post_location: String,

    /// Enabled Markdown extensions.
    #[serde(default = "default_markdown_extensions")]
    pub markdown_extensions: Vec<String>,

    /// Syntax highlighting theme name.
    #[serde(default = "default_syntax_theme")]
    pub syntax_theme: String,
}

/// Asset processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// LESS compiler command with `{source}` and `{dest}` placeholders.
    #[serde(default)]
    pub less_cmd: Option<String>,
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_root_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_rel_root_url() -> String {
    "/".to_string()
}

fn default_tags() -> Vec<String> {
    vec!["misc".to_string()]
}

fn default_pages_path() -> PathBuf {
    PathBuf::from("pages")
}

fn default_posts_path() -> PathBuf {
    PathBuf::from("posts")
}

fn default_assets_path() -> PathBuf {
    PathBuf::from("assets")
}

fn default_build_path() -> PathBuf {
    PathBuf::from("www")
}

fn default_templates_path() -> PathBuf {
    PathBuf::from("templates")
}

fn default_prototypes_path() -> PathBuf {
    PathBuf::from("prototypes")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".pubstatic/cache.json")
}

fn default_page_template() -> String {
    "page".to_string()
}

fn default_post_template() -> String {
    "post".to_string()
}

fn default_time_formats() -> Vec<String> {
    vec![
        "%Y-%m-%d %H:%M:%S".to_string(),
        "%Y-%m-%d %H:%M".to_string(),
        "%Y-%m-%d".to_string(),
    ]
}

fn default_post_location() -> String {
    "{year}/{month}/{day}/{name}{suffix}.html".to_string()
}

fn default_markdown_extensions() -> Vec<String> {
    ["tables", "footnotes", "strikethrough", "highlight"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_syntax_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(format) => vec![format],
        OneOrMany::Many(formats) => formats,
    })
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            author: String::new(),
            root_url: default_root_url(),
            rel_root_url: default_rel_root_url(),
            source_url: String::new(),
            default_tags: default_tags(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pages: default_pages_path(),
            posts: default_posts_path(),
            assets: default_assets_path(),
            build: default_build_path(),
            templates: default_templates_path(),
            prototypes: default_prototypes_path(),
            cache: default_cache_path(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            page_template: default_page_template(),
            post_template: default_post_template(),
            time_formats: default_time_formats(),
            post_location: default_post_location(),
            markdown_extensions: default_markdown_extensions(),
            syntax_theme: default_syntax_theme(),
        }
    }
}

impl Config {
    /// Load and resolve configuration from a TOML or YAML file.
    ///
    /// The format is picked by extension: `.yaml`/`.yml` are read as YAML,
    /// everything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| {
                CoreError::config_with_source(
                    format!("Failed to parse config file: {}", path.display()),
                    e,
                )
            })?
        } else {
            toml::from_str(&content).map_err(|e| {
                CoreError::config_with_source(
                    format!("Failed to parse config file: {}", path.display()),
                    e,
                )
            })?
        };

        config.resolve(base_dir(path))
    }

    /// Load configuration with `PUBSTATIC__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("PUBSTATIC").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.resolve(base_dir(path))
    }

    /// Resolve relative paths against `base`, normalize URLs and validate.
    ///
    /// A relative `base` is taken from the current directory, so every
    /// resolved path is absolute.
    pub fn resolve(mut self, base: &Path) -> Result<Self> {
        let base = absolute_dir(base)?;
        let paths = &mut self.paths;
        for path in [
            &mut paths.pages,
            &mut paths.posts,
            &mut paths.assets,
            &mut paths.build,
            &mut paths.templates,
            &mut paths.prototypes,
            &mut paths.cache,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }

        self.site.root_url = trailing_slash(&self.site.root_url);
        self.site.rel_root_url = trailing_slash(&self.site.rel_root_url);
        let source_url = self.site.source_url.trim();
        self.site.source_url = if source_url.is_empty() {
            String::new()
        } else {
            trailing_slash(source_url)
        };

        self.content.post_location = with_suffix(self.content.post_location.trim());

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.content.post_location == SUFFIX_PLACEHOLDER {
            return Err(CoreError::config("content.post_location cannot be empty"));
        }

        if self.content.time_formats.is_empty() {
            return Err(CoreError::config(
                "content.time_formats must list at least one format",
            ));
        }

        if self.paths.build == self.paths.pages || self.paths.build == self.paths.posts {
            return Err(CoreError::config(
                "paths.build must differ from the content directories",
            ));
        }

        Ok(())
    }

    /// The site root URL, absolute when `full` is set.
    pub fn root_url(&self, full: bool) -> &str {
        if full {
            &self.site.root_url
        } else {
            &self.site.rel_root_url
        }
    }

    /// Primary timestamp format, used when writing new content.
    pub fn primary_time_format(&self) -> &str {
        self.content
            .time_formats
            .first()
            .map_or("%Y-%m-%d %H:%M:%S", String::as_str)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Directory holding the configuration file; empty for a bare file name.
fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new(""))
}

fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() {
        Ok(std::env::current_dir()?)
    } else {
        Ok(std::path::absolute(dir)?)
    }
}

/// Guarantee a single trailing slash.
fn trailing_slash(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}

/// Insert `{suffix}` before the file extension unless already present.
fn with_suffix(location: &str) -> String {
    if location.contains(SUFFIX_PLACEHOLDER) {
        return location.to_string();
    }

    let file_start = location.rfind('/').map_or(0, |i| i + 1);
    match location[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = file_start + dot;
            format!(
                "{}{SUFFIX_PLACEHOLDER}{}",
                &location[..dot],
                &location[dot..]
            )
        }
        _ => format!("{location}{SUFFIX_PLACEHOLDER}"),
    }
}
