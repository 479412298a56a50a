//! Front matter parsing for pages and posts.
//!
//! A source file starts with `key: value` (or `key = value`) lines. The
//! header ends at the first line that does not match, blank lines included,
//! and everything from there on is the body. Header lines cannot resume once
//! the body has started, so a blank line inside the header ends it early.

use std::{collections::BTreeMap, sync::LazyLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::{config::Config, error::Result, slug::slugify};

static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\w-]+)\s*[:=](.*)$").expect("valid header regex"));

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid h1 regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Renders a content body to HTML.
///
/// Implemented by the Markdown renderer; the core only needs the seam.
pub trait BodyRenderer: Send + Sync {
    /// Render `body` to HTML.
    fn render(&self, body: &str) -> Result<String>;
}

/// A tag with its listing URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub url: String,
}

impl Tag {
    /// Build a tag whose URL points at `<rel_root>tags/<slug>.html`.
    pub fn new(name: impl Into<String>, rel_root_url: &str) -> Self {
        let name = name.into();
        let url = format!("{rel_root_url}tags/{}.html", slugify(&name));
        Self { name, url }
    }
}

/// Resolved metadata of a parseable source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Raw header fields with lower-cased keys and trimmed values.
    pub fields: BTreeMap<String, String>,
    pub title: String,
    pub template: String,
    pub author: String,
    pub tags: Vec<Tag>,
    pub source_url: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Rendered body.
    pub content: String,
}

/// Per-file fallbacks for metadata resolution.
#[derive(Debug, Clone)]
pub struct FileDefaults<'a> {
    /// Template used when the header names none.
    pub template: &'a str,
    pub source_url: Option<String>,
    /// File system creation time.
    pub created: DateTime<Utc>,
    /// File system modification time.
    pub updated: DateTime<Utc>,
}

/// Split text into header fields and the verbatim body.
pub fn split_frontmatter(text: &str) -> (BTreeMap<String, String>, &str) {
    let mut fields = BTreeMap::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let stripped = line.trim_end_matches(['\n', '\r']);
        let Some(caps) = PARAM_RE.captures(stripped) else {
            return (fields, &text[offset..]);
        };

        fields.insert(caps[1].to_lowercase(), caps[2].trim().to_string());
        offset += line.len();
    }

    (fields, "")
}

/// Parse text into fully resolved metadata.
///
/// Header values win over computed defaults. An unparseable `created` or
/// `updated` value falls back to the file system time with a warning.
pub fn parse_metadata(
    text: &str,
    defaults: FileDefaults<'_>,
    config: &Config,
    renderer: &dyn BodyRenderer,
) -> Result<Metadata> {
    let (fields, body) = split_frontmatter(text);
    let content = renderer.render(body)?;
    let formats = &config.content.time_formats;

    let title = match fields.get("title") {
        Some(title) => title.clone(),
        None => first_heading(&content).unwrap_or_default(),
    };

    let template = fields
        .get("template")
        .cloned()
        .unwrap_or_else(|| defaults.template.to_string());

    let author = fields
        .get("author")
        .cloned()
        .unwrap_or_else(|| config.site.author.clone());

    let tags = match fields.get("tags") {
        Some(value) => split_tags(value)
            .map(|name| Tag::new(name, &config.site.rel_root_url))
            .collect(),
        None => config
            .site
            .default_tags
            .iter()
            .map(|name| Tag::new(name.as_str(), &config.site.rel_root_url))
            .collect(),
    };

    let created = resolve_time(&fields, "created", formats, defaults.created);
    let updated = resolve_time(&fields, "updated", formats, defaults.updated);

    Ok(Metadata {
        fields,
        title,
        template,
        author,
        tags,
        source_url: defaults.source_url,
        created,
        updated,
        content,
    })
}

/// Parse a timestamp against a list of formats, first match wins.
///
/// Formats without a time part are accepted and resolve to midnight.
pub fn parse_timestamp(value: &str, formats: &[String]) -> Option<DateTime<Utc>> {
    let value = value.trim();
    formats.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .map(|naive| naive.and_utc())
    })
}

fn resolve_time(
    fields: &BTreeMap<String, String>,
    key: &str,
    formats: &[String],
    fallback: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(value) = fields.get(key) else {
        return fallback;
    };

    parse_timestamp(value, formats).unwrap_or_else(|| {
        tracing::warn!(
            field = key,
            value = value.as_str(),
            "unrecognized timestamp, using file system time"
        );
        fallback
    })
}

fn split_tags(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}

/// Text of the first `<h1>` element in rendered HTML.
pub fn first_heading(html: &str) -> Option<String> {
    let inner = H1_RE.captures(html)?.get(1)?.as_str();
    let text = unescape(TAG_RE.replace_all(inner, "").trim());
    (!text.is_empty()).then_some(text)
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    /// Stand-in renderer producing an `<h1>` for a leading `# ` line.
    struct HeadingRenderer;

    impl BodyRenderer for HeadingRenderer {
        fn render(&self, body: &str) -> Result<String> {
            Ok(body
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| match line.strip_prefix("# ") {
                    Some(heading) => format!("<h1>{heading}</h1>"),
                    None => format!("<p>{line}</p>"),
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    fn fs_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 4, 1, 10, 0, 0).unwrap()
    }

    fn defaults() -> FileDefaults<'static> {
        FileDefaults {
            template: "page",
            source_url: None,
            created: fs_time(),
            updated: fs_time(),
        }
    }

    #[test]
    fn test_split_frontmatter() {
        let text = "title: My Page\ntags: go, rust\n\n# Heading\nBody text";
        let (fields, body) = split_frontmatter(text);

        assert_eq!(fields["title"], "My Page");
        assert_eq!(fields["tags"], "go, rust");
        assert_eq!(body, "\n# Heading\nBody text");
    }

    #[test]
    fn test_split_keys_are_lowercased_and_values_trimmed() {
        let (fields, body) = split_frontmatter("  Title =   Spaced Out  \r\nAUTHOR:me\r\nbody");
        assert_eq!(fields["title"], "Spaced Out");
        assert_eq!(fields["author"], "me");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_split_stops_at_blank_line() {
        let (fields, body) = split_frontmatter("title: One\n\nauthor: Two\nText");
        assert_eq!(fields.len(), 1);
        assert_eq!(body, "\nauthor: Two\nText");
    }

    #[test]
    fn test_split_header_only() {
        let (fields, body) = split_frontmatter("title: Only\n");
        assert_eq!(fields["title"], "Only");
        assert_eq!(body, "");
    }

    #[test]
    fn test_split_no_header() {
        let (fields, body) = split_frontmatter("# Heading\n\nText");
        assert!(fields.is_empty());
        assert_eq!(body, "# Heading\n\nText");
    }

    #[test]
    fn test_parse_metadata_explicit_fields() {
        let config = Config::default();
        let text = "title: My Page\ntags: go, rust\n\n# Heading\nBody text";
        let meta = parse_metadata(text, defaults(), &config, &HeadingRenderer).unwrap();

        assert_eq!(meta.title, "My Page");
        let names: Vec<_> = meta.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["go", "rust"]);
        assert_eq!(meta.tags[0].url, "/tags/go.html");
        assert_eq!(meta.content, "<h1>Heading</h1>\n<p>Body text</p>");
        assert_eq!(meta.template, "page");
    }

    #[test]
    fn test_title_from_first_heading() {
        let config = Config::default();
        let meta =
            parse_metadata("# About Us\n\nWho we are.", defaults(), &config, &HeadingRenderer)
                .unwrap();
        assert_eq!(meta.title, "About Us");
    }

    #[test]
    fn test_default_tags_and_author() {
        let mut config = Config::default();
        config.site.author = "Site Owner".to_string();
        config.site.default_tags = vec!["General".to_string()];

        let meta = parse_metadata("Body", defaults(), &config, &HeadingRenderer).unwrap();
        assert_eq!(meta.author, "Site Owner");
        assert_eq!(meta.tags, vec![Tag::new("General", "/")]);
        assert_eq!(meta.tags[0].url, "/tags/general.html");
    }

    #[test]
    fn test_explicit_empty_tags_stay_empty() {
        let config = Config::default();
        let meta = parse_metadata("tags: , ,\n\nBody", defaults(), &config, &HeadingRenderer)
            .unwrap();
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_explicit_timestamps() {
        let config = Config::default();
        let text = "created: 2020-02-03 04:05:06\nupdated: 2021-01-01\n\nBody";
        let meta = parse_metadata(text, defaults(), &config, &HeadingRenderer).unwrap();

        assert_eq!(meta.created, Utc.with_ymd_and_hms(2020, 2, 3, 4, 5, 6).unwrap());
        assert_eq!(meta.updated, Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_bad_timestamp_falls_back_to_file_time() {
        let config = Config::default();
        let text = "created: last tuesday\n\nBody";
        let meta = parse_metadata(text, defaults(), &config, &HeadingRenderer).unwrap();

        assert_eq!(meta.created, fs_time());
        assert_eq!(meta.fields["created"], "last tuesday");
    }

    #[test]
    fn test_source_url_is_not_overridable() {
        let config = Config::default();
        let file_defaults = FileDefaults {
            source_url: Some("https://git.example/blob/master/pages/a.md".to_string()),
            ..defaults()
        };
        let meta = parse_metadata(
            "source_url: https://evil.example\n\nBody",
            file_defaults,
            &config,
            &HeadingRenderer,
        )
        .unwrap();

        assert_eq!(
            meta.source_url.as_deref(),
            Some("https://git.example/blob/master/pages/a.md")
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let config = Config::default();
        let text = "title: Same\ntags: a, b\ncreated: 2022-05-06\n\n# Ignored\nBody";
        let first = parse_metadata(text, defaults(), &config, &HeadingRenderer).unwrap();
        let second = parse_metadata(text, defaults(), &config, &HeadingRenderer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_timestamp_formats_in_order() {
        let formats = vec!["%d.%m.%Y".to_string(), "%Y-%m-%d %H:%M".to_string()];
        assert_eq!(
            parse_timestamp("24.12.2022", &formats),
            Some(Utc.with_ymd_and_hms(2022, 12, 24, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(" 2022-12-24 18:30 ", &formats),
            Some(Utc.with_ymd_and_hms(2022, 12, 24, 18, 30, 0).unwrap())
        );
        assert_eq!(parse_timestamp("Christmas", &formats), None);
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(
            first_heading("<p>x</p><h1 id=\"a\">Hello <em>there</em></h1><h1>Second</h1>"),
            Some("Hello there".to_string())
        );
        assert_eq!(
            first_heading("<h1>Fish &amp; Chips</h1>"),
            Some("Fish & Chips".to_string())
        );
        assert_eq!(first_heading("<h2>Nope</h2>"), None);
    }
}
