//! Markdown renderer using pulldown-cmark.

use pubstatic_core::{BodyRenderer, Result as CoreResult};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};

use crate::syntax::SyntaxHighlighter;

/// Markdown renderer with configurable extensions and code highlighting.
#[derive(Debug)]
pub struct MarkdownRenderer {
    options: Options,
    highlighter: Option<SyntaxHighlighter>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(
            &["tables", "footnotes", "strikethrough", "highlight"],
            "base16-ocean.dark",
        )
    }
}

impl MarkdownRenderer {
    /// Create a renderer enabling the named extensions.
    ///
    /// Recognized names are `tables`, `footnotes`, `strikethrough`,
    /// `tasklists`, `smartypants`, `heading_attributes` and `highlight`.
    /// `extra` enables tables and footnotes, `codehilite` is an alias of
    /// `highlight`, and `fenced_code` is accepted as always on. Anything else
    /// is ignored with a warning.
    pub fn new<S: AsRef<str>>(extensions: &[S], theme: &str) -> Self {
        let mut options = Options::empty();
        let mut highlight = false;

        for name in extensions {
            match name.as_ref().trim().to_ascii_lowercase().as_str() {
                "tables" => options.insert(Options::ENABLE_TABLES),
                "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
                "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
                "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
                "smartypants" => options.insert(Options::ENABLE_SMART_PUNCTUATION),
                "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
                "extra" => options.insert(Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES),
                "highlight" | "codehilite" => highlight = true,
                "fenced_code" => {}
                other => tracing::warn!(extension = other, "unknown markdown extension"),
            }
        }

        Self {
            options,
            highlighter: highlight.then(|| SyntaxHighlighter::new(theme)),
        }
    }

    /// Render a Markdown body to HTML.
    pub fn render_html(&self, body: &str) -> String {
        let parser = Parser::new_ext(body, self.options);
        let mut out = String::with_capacity(body.len() * 3 / 2);

        let Some(highlighter) = &self.highlighter else {
            html::push_html(&mut out, parser);
            return out;
        };

        let mut events = Vec::new();
        let mut code: Option<(String, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang)))
                    if !lang.trim().is_empty() =>
                {
                    let lang = lang.split_whitespace().next().unwrap_or_default();
                    code = Some((lang.to_string(), String::new()));
                    events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(
                        lang.to_string().into(),
                    ))));
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buf)) = code.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if code.is_some() => {
                    let Some((lang, buf)) = code.take() else {
                        continue;
                    };
                    match highlighter.highlight(&buf, &lang) {
                        Some(highlighted) => {
                            events.pop();
                            events.push(Event::Html(highlighted.into()));
                        }
                        None => {
                            events.push(Event::Text(buf.into()));
                            events.push(Event::End(TagEnd::CodeBlock));
                        }
                    }
                }
                other => events.push(other),
            }
        }

        html::push_html(&mut out, events.into_iter());
        out
    }
}

impl BodyRenderer for MarkdownRenderer {
    fn render(&self, body: &str) -> CoreResult<String> {
        Ok(self.render_html(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple_markdown() {
        let renderer = MarkdownRenderer::default();
        let html = renderer.render_html("# Hello World\n\nThis is a test.");

        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_highlighted_code_block() {
        let renderer = MarkdownRenderer::default();
        let html = renderer.render_html("```rust\nfn main() {}\n```\n");

        assert!(html.contains("<pre style="));
        assert!(!html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn test_unknown_language_stays_plain() {
        let renderer = MarkdownRenderer::default();
        let html = renderer.render_html("```nosuchlang\na < b\n```\n");

        assert!(html.contains("<code class=\"language-nosuchlang\">"));
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn test_highlight_disabled() {
        let renderer = MarkdownRenderer::new(&["tables"], "base16-ocean.dark");
        let html = renderer.render_html("```rust\nlet x = 1;\n```\n");

        assert!(html.contains("<code class=\"language-rust\">let x = 1;"));
    }

    #[test]
    fn test_table_extension() {
        let table = "| A | B |\n|---|---|\n| 1 | 2 |\n";

        let with = MarkdownRenderer::new(&["extra"], "base16-ocean.dark");
        assert!(with.render_html(table).contains("<table>"));

        let without = MarkdownRenderer::new::<&str>(&[], "base16-ocean.dark");
        assert!(!without.render_html(table).contains("<table>"));
    }

    #[test]
    fn test_body_renderer() {
        let renderer = MarkdownRenderer::new(&["bogus", "strikethrough"], "base16-ocean.dark");
        let html = BodyRenderer::render(&renderer, "~~gone~~").unwrap();
        assert!(html.contains("<del>gone</del>"));
    }
}
