//! Template contexts for rendered output.
//!
//! Every rendered file starts from the site context. Pages and posts add
//! their raw header fields, then the resolved metadata on top, so a custom
//! header key is available to templates but cannot shadow a resolved one.

use pubstatic_core::{Config, Metadata, Parseable, Tag};

use crate::template::TemplateContext;

/// Variables shared by every template.
pub fn site_context(config: &Config) -> TemplateContext {
    TemplateContext::new()
        .with_var("site_title", &config.site.title)
        .with_var("author", &config.site.author)
        .with_var("root_url", &config.site.root_url)
        .with_var("rel_root_url", &config.site.rel_root_url)
}

/// Context for a page or post.
pub fn unit_context(config: &Config, unit: &dyn Parseable) -> TemplateContext {
    let meta = unit.metadata();
    let mut ctx = site_context(config);

    for (key, value) in &meta.fields {
        ctx.insert(key.as_str(), value.as_str());
    }

    insert_metadata(&mut ctx, config, meta);
    ctx.insert("url", unit.url(config, false));
    ctx.insert("full_url", unit.url(config, true));

    if let Some(source_url) = &meta.source_url {
        ctx.insert("source_url", source_url.as_str());
        ctx.insert(
            "source_link",
            format!(
                r#"<a class="source" href="{}">Source</a>"#,
                html_escape(source_url)
            ),
        );
    }

    ctx
}

fn insert_metadata(ctx: &mut TemplateContext, config: &Config, meta: &Metadata) {
    let format = config.primary_time_format();

    ctx.insert("title", meta.title.as_str());
    ctx.insert("template", meta.template.as_str());
    ctx.insert("author", meta.author.as_str());
    ctx.insert("created", meta.created.format(format).to_string());
    ctx.insert("created_iso", meta.created.to_rfc3339());
    ctx.insert("updated", meta.updated.format(format).to_string());
    ctx.insert("updated_iso", meta.updated.to_rfc3339());
    ctx.insert("content", meta.content.as_str());
    ctx.insert(
        "tags",
        meta.tags
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    );
    ctx.insert("tags_html", tags_html(&meta.tags));
}

/// Tag links as an HTML list, empty when there are no tags.
pub fn tags_html(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return String::new();
    }

    let items: String = tags
        .iter()
        .map(|tag| {
            format!(
                r#"<li><a href="{}" rel="tag">{}</a></li>"#,
                html_escape(&tag.url),
                html_escape(&tag.name)
            )
        })
        .collect();
    format!(r#"<ul class="tags">{items}</ul>"#)
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
