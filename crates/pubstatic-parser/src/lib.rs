//! pubstatic Parser Library
//!
//! Markdown rendering with syntax highlighted code blocks.

pub mod markdown;
pub mod syntax;

pub use markdown::MarkdownRenderer;
pub use syntax::SyntaxHighlighter;

use pubstatic_core::Config;

/// Build the body renderer described by the site configuration.
pub fn renderer_for(config: &Config) -> MarkdownRenderer {
    MarkdownRenderer::new(
        &config.content.markdown_extensions,
        &config.content.syntax_theme,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_for_config() {
        let mut config = Config::default();
        config.content.markdown_extensions = vec!["strikethrough".to_string()];

        let renderer = renderer_for(&config);
        assert!(renderer.render_html("~~x~~").contains("<del>"));
        assert!(!renderer.render_html("| a |\n|---|\n| b |\n").contains("<table>"));
    }
}
