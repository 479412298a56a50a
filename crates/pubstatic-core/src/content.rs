//! Content units: the source files a site is built from.
//!
//! There are three kinds. Assets are copied (or compiled) without parsing;
//! pages and posts carry a front matter header and a Markdown body. All of
//! them share [`SourceFile`] and the [`ContentUnit`] capability trait, and
//! each computes its output path once, at construction.

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::Config,
    error::{CoreError, Result},
    frontmatter::{BodyRenderer, FileDefaults, Metadata, parse_metadata},
    route,
};

/// Kind of content unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Asset,
    Page,
    Post,
}

impl ContentKind {
    /// The configured source root for this kind.
    pub fn source_dir(self, config: &Config) -> &Path {
        match self {
            Self::Asset => &config.paths.assets,
            Self::Page => &config.paths.pages,
            Self::Post => &config.paths.posts,
        }
    }

    /// Template used for units of this kind whose header names none.
    /// Assets are copied, not rendered, and have no template.
    pub fn default_template(self, config: &Config) -> Option<&str> {
        match self {
            Self::Asset => None,
            Self::Page => Some(&config.content.page_template),
            Self::Post => Some(&config.content.post_template),
        }
    }

    /// Lower-case kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Page => "page",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by every content unit.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    rel_path: PathBuf,
    ext: String,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    processed: bool,
}

impl SourceFile {
    /// Open `file_name` under `source_dir`, reading its file system times.
    ///
    /// Creation time falls back to modification time on file systems that
    /// do not record it.
    pub fn open(source_dir: &Path, file_name: impl AsRef<Path>) -> Result<Self> {
        let path = source_dir.join(file_name);
        if !path.is_file() {
            return Err(CoreError::not_found(path));
        }

        let meta = fs::metadata(&path)?;
        let updated = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = meta.created().unwrap_or(updated);

        let rel_path = path
            .strip_prefix(source_dir)
            .map(Path::to_path_buf)
            .map_err(|_| CoreError::not_found(&path))?;

        Ok(Self::new(
            path,
            rel_path,
            DateTime::from(created),
            DateTime::from(updated),
        ))
    }

    /// Build from known parts without touching the file system.
    pub fn new(
        path: PathBuf,
        rel_path: PathBuf,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    ) -> Self {
        let ext = rel_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Self {
            path,
            rel_path,
            ext,
            created,
            updated,
            processed: false,
        }
    }

    /// Absolute source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the kind's source root.
    pub fn rel_path(&self) -> &Path {
        &self.rel_path
    }

    /// Lower-cased extension with its leading dot, or empty.
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Source file base name.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File system creation time.
    pub fn fs_created(&self) -> DateTime<Utc> {
        self.created
    }

    /// File system modification time.
    pub fn fs_updated(&self) -> DateTime<Utc> {
        self.updated
    }

    fn read_text(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| CoreError::parse(&self.path, e.to_string()))
    }
}

/// Capabilities shared by all content units.
pub trait ContentUnit: Send + Sync {
    fn kind(&self) -> ContentKind;

    fn source(&self) -> &SourceFile;

    fn source_mut(&mut self) -> &mut SourceFile;

    /// Output path relative to the build root.
    fn rel_dest(&self) -> &Path;

    fn created(&self) -> DateTime<Utc> {
        self.source().created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.source().updated
    }

    fn source_dir<'c>(&self, config: &'c Config) -> &'c Path {
        self.kind().source_dir(config)
    }

    /// Absolute output path.
    fn destination(&self, config: &Config) -> PathBuf {
        config.paths.build.join(self.rel_dest())
    }

    /// Absolute URL when `full`, site-relative otherwise.
    fn url(&self, config: &Config, full: bool) -> String {
        route::url_for(config.root_url(full), self.rel_dest())
    }

    /// Link to the file in the site's source repository, if configured.
    fn source_url(&self, config: &Config) -> Option<String> {
        source_url(config, self.kind(), self.source())
    }

    /// Whether output has been written during the current run.
    fn processed(&self) -> bool {
        self.source().processed
    }

    fn set_processed(&mut self, processed: bool) {
        self.source_mut().processed = processed;
    }
}

/// Content units with a front matter header.
pub trait Parseable: ContentUnit {
    fn metadata(&self) -> &Metadata;

    /// Template used when the header names none.
    fn default_template<'c>(&self, config: &'c Config) -> &'c str {
        self.kind().default_template(config).unwrap_or_default()
    }
}

fn source_url(config: &Config, kind: ContentKind, file: &SourceFile) -> Option<String> {
    let root = &config.site.source_url;
    if root.is_empty() {
        return None;
    }

    let kind_dir = kind
        .source_dir(config)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{kind}s"));

    Some(format!("{root}blob/master/{kind_dir}/{}", file.basename()))
}

/// A static file copied or compiled into the build.
#[derive(Debug, Clone)]
pub struct AssetFile {
    file: SourceFile,
    rel_dest: PathBuf,
}

impl AssetFile {
    /// Open an asset under the configured asset root.
    pub fn open(config: &Config, file_name: impl AsRef<Path>) -> Result<Self> {
        let file = SourceFile::open(&config.paths.assets, file_name)?;
        Ok(Self::from_source(file))
    }

    pub fn from_source(file: SourceFile) -> Self {
        let rel_dest = route::asset_destination(file.rel_path());
        Self { file, rel_dest }
    }
}

impl ContentUnit for AssetFile {
    fn kind(&self) -> ContentKind {
        ContentKind::Asset
    }

    fn source(&self) -> &SourceFile {
        &self.file
    }

    fn source_mut(&mut self) -> &mut SourceFile {
        &mut self.file
    }

    fn rel_dest(&self) -> &Path {
        &self.rel_dest
    }
}

/// A standalone page.
#[derive(Debug, Clone)]
pub struct PageFile {
    file: SourceFile,
    rel_dest: PathBuf,
    meta: Metadata,
}

impl PageFile {
    /// Open and parse a page under the configured page root.
    pub fn open(
        config: &Config,
        file_name: impl AsRef<Path>,
        renderer: &dyn BodyRenderer,
    ) -> Result<Self> {
        let file = SourceFile::open(&config.paths.pages, file_name)?;
        let text = file.read_text()?;
        Self::from_text(config, file, &text, renderer)
    }

    /// Build a page from already loaded text.
    pub fn from_text(
        config: &Config,
        file: SourceFile,
        text: &str,
        renderer: &dyn BodyRenderer,
    ) -> Result<Self> {
        let defaults = FileDefaults {
            template: ContentKind::Page.default_template(config).unwrap_or_default(),
            source_url: source_url(config, ContentKind::Page, &file),
            created: file.created,
            updated: file.updated,
        };
        let meta = parse_metadata(text, defaults, config, renderer)?;
        let rel_dest = route::page_destination(file.rel_path());

        Ok(Self {
            file,
            rel_dest,
            meta,
        })
    }
}

impl ContentUnit for PageFile {
    fn kind(&self) -> ContentKind {
        ContentKind::Page
    }

    fn source(&self) -> &SourceFile {
        &self.file
    }

    fn source_mut(&mut self) -> &mut SourceFile {
        &mut self.file
    }

    fn rel_dest(&self) -> &Path {
        &self.rel_dest
    }

    fn created(&self) -> DateTime<Utc> {
        self.meta.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.meta.updated
    }

    fn source_url(&self, _config: &Config) -> Option<String> {
        self.meta.source_url.clone()
    }
}

impl Parseable for PageFile {
    fn metadata(&self) -> &Metadata {
        &self.meta
    }
}

/// A dated blog post.
#[derive(Debug, Clone)]
pub struct PostFile {
    file: SourceFile,
    rel_dest: PathBuf,
    meta: Metadata,
}

impl PostFile {
    /// Open and parse a post under the configured post root.
    pub fn open(
        config: &Config,
        file_name: impl AsRef<Path>,
        renderer: &dyn BodyRenderer,
    ) -> Result<Self> {
        let file = SourceFile::open(&config.paths.posts, file_name)?;
        let text = file.read_text()?;
        Self::from_text(config, file, &text, renderer)
    }

    /// Build a post from already loaded text.
    pub fn from_text(
        config: &Config,
        file: SourceFile,
        text: &str,
        renderer: &dyn BodyRenderer,
    ) -> Result<Self> {
        let defaults = FileDefaults {
            template: ContentKind::Post.default_template(config).unwrap_or_default(),
            source_url: source_url(config, ContentKind::Post, &file),
            created: file.created,
            updated: file.updated,
        };
        let meta = parse_metadata(text, defaults, config, renderer)?;
        let rel_dest = route::post_destination(
            file.rel_path(),
            meta.created,
            &config.content.post_location,
            "",
        );

        Ok(Self {
            file,
            rel_dest,
            meta,
        })
    }
}

impl ContentUnit for PostFile {
    fn kind(&self) -> ContentKind {
        ContentKind::Post
    }

    fn source(&self) -> &SourceFile {
        &self.file
    }

    fn source_mut(&mut self) -> &mut SourceFile {
        &mut self.file
    }

    fn rel_dest(&self) -> &Path {
        &self.rel_dest
    }

    fn created(&self) -> DateTime<Utc> {
        self.meta.created
    }

    fn updated(&self) -> DateTime<Utc> {
        self.meta.updated
    }

    fn source_url(&self, _config: &Config) -> Option<String> {
        self.meta.source_url.clone()
    }
}

impl Parseable for PostFile {
    fn metadata(&self) -> &Metadata {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct PlainRenderer;

    impl BodyRenderer for PlainRenderer {
        fn render(&self, body: &str) -> Result<String> {
            Ok(match body.trim().strip_prefix("# ") {
                Some(rest) => format!("<h1>{}</h1>", rest.lines().next().unwrap_or_default()),
                None => format!("<p>{}</p>", body.trim()),
            })
        }
    }

    fn site_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.site.source_url = "https://github.com/jane/site".to_string();
        config.site.root_url = "https://jane.example".to_string();
        config.content.post_location = "{year}/{month}/{name}{suffix}.html".to_string();
        config.resolve(root).expect("resolve")
    }

    fn april_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_post_routes_by_file_system_creation_time() {
        let config = site_config(Path::new("/site"));
        let file = SourceFile::new(
            PathBuf::from("/site/posts/2023-04-01-hello-world.md"),
            PathBuf::from("2023-04-01-hello-world.md"),
            april_first(),
            april_first(),
        );

        let post = PostFile::from_text(&config, file, "Hello!", &PlainRenderer).unwrap();

        assert_eq!(post.rel_dest(), Path::new("2023/04/hello-world.html"));
        assert_eq!(
            post.destination(&config),
            PathBuf::from("/site/www/2023/04/hello-world.html")
        );
        assert_eq!(
            post.url(&config, true),
            "https://jane.example/2023/04/hello-world.html"
        );
        assert_eq!(post.url(&config, false), "/2023/04/hello-world.html");
        assert_eq!(post.metadata().template, "post");
    }

    #[test]
    fn test_post_routes_by_explicit_created() {
        let config = site_config(Path::new("/site"));
        let file = SourceFile::new(
            PathBuf::from("/site/posts/1999-12-31-party.md"),
            PathBuf::from("1999-12-31-party.md"),
            april_first(),
            april_first(),
        );

        let post =
            PostFile::from_text(&config, file, "created: 2001-02-03\n\nBody", &PlainRenderer)
                .unwrap();

        assert_eq!(post.rel_dest(), Path::new("2001/02/party.html"));
        assert_eq!(post.created(), Utc.with_ymd_and_hms(2001, 2, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_page_title_from_heading() {
        let config = site_config(Path::new("/site"));
        let file = SourceFile::new(
            PathBuf::from("/site/pages/about.md"),
            PathBuf::from("about.md"),
            april_first(),
            april_first(),
        );

        let page = PageFile::from_text(&config, file, "# About Us\n\nHi.", &PlainRenderer).unwrap();

        assert_eq!(page.metadata().title, "About Us");
        assert_eq!(page.rel_dest(), Path::new("about.html"));
        assert_eq!(page.source().ext(), ".md");
        assert_eq!(
            page.source_url(&config).as_deref(),
            Some("https://github.com/jane/site/blob/master/pages/about.md")
        );
    }

    #[test]
    fn test_header_less_units_use_configured_templates() {
        let mut config = site_config(Path::new("/site"));
        config.content.page_template = "wide".to_string();
        config.content.post_template = "article".to_string();
        let page_file = SourceFile::new(
            PathBuf::from("/site/pages/about.md"),
            PathBuf::from("about.md"),
            april_first(),
            april_first(),
        );
        let post_file = SourceFile::new(
            PathBuf::from("/site/posts/2023-04-01-hello.md"),
            PathBuf::from("2023-04-01-hello.md"),
            april_first(),
            april_first(),
        );

        let page = PageFile::from_text(&config, page_file, "Hi.", &PlainRenderer).unwrap();
        let post = PostFile::from_text(&config, post_file.clone(), "Hi.", &PlainRenderer).unwrap();
        let chosen =
            PostFile::from_text(&config, post_file, "template: page

Hi.", &PlainRenderer)
                .unwrap();

        assert_eq!(page.metadata().template, "wide");
        assert_eq!(page.default_template(&config), "wide");
        assert_eq!(post.metadata().template, "article");
        assert_eq!(post.default_template(&config), "article");
        assert_eq!(chosen.metadata().template, "page");
        assert_eq!(chosen.default_template(&config), "article");
        assert_eq!(ContentKind::Asset.default_template(&config), None);
    }

    #[test]
    fn test_source_url_absent_without_base() {
        let config = Config::default().resolve(Path::new("/site")).unwrap();
        let file = SourceFile::new(
            PathBuf::from("/site/posts/x.md"),
            PathBuf::from("x.md"),
            april_first(),
            april_first(),
        );
        let post = PostFile::from_text(&config, file, "Body", &PlainRenderer).unwrap();
        assert!(post.source_url(&config).is_none());
    }

    #[test]
    fn test_open_asset() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::default().resolve(dir.path()).unwrap();
        fs::create_dir_all(config.paths.assets.join("styles")).unwrap();
        fs::write(config.paths.assets.join("styles/site.less"), "@c: red;").unwrap();

        let asset = AssetFile::open(&config, "styles/site.less").unwrap();

        assert_eq!(asset.rel_dest(), Path::new("styles/site.css"));
        assert_eq!(asset.source().ext(), ".less");
        assert_eq!(asset.kind(), ContentKind::Asset);
        assert!(!asset.processed());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::default().resolve(dir.path()).unwrap();

        let result = PageFile::open(&config, "missing.md", &PlainRenderer);
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn test_open_page_reads_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::default().resolve(dir.path()).unwrap();
        fs::create_dir_all(&config.paths.pages).unwrap();
        fs::write(config.paths.pages.join("contact.md"), "title: Contact\n\nMail us.").unwrap();

        let mut page = PageFile::open(&config, "contact.md", &PlainRenderer).unwrap();

        assert_eq!(page.metadata().title, "Contact");
        assert_eq!(page.metadata().content, "<p>Mail us.</p>");
        page.set_processed(true);
        assert!(page.processed());
    }
}
