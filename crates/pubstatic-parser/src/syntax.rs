//! Syntax highlighting for code blocks.

use syntect::{
    highlighting::{Theme, ThemeSet},
    html::highlighted_html_for_string,
    parsing::SyntaxSet,
};

/// Syntax highlighter using syntect.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new("base16-ocean.dark")
    }
}

impl SyntaxHighlighter {
    /// Create a highlighter for the named theme.
    ///
    /// Unknown theme names fall back to the first bundled theme.
    pub fn new(theme: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme) {
            Some(found) => found,
            None => {
                tracing::warn!(theme, "unknown syntax theme, using default");
                themes
                    .remove("base16-ocean.dark")
                    .or_else(|| themes.into_values().next())
                    .unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Highlight `code` written in `lang`.
    ///
    /// Returns `None` when the language is unknown or highlighting fails, so
    /// the caller can emit a plain code block instead.
    pub fn highlight(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = self.syntax_set.find_syntax_by_token(lang)?;
        match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme) {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::debug!(lang, error = %e, "highlighting failed");
                None
            }
        }
    }
}
