//! URL-safe name generation.

use deunicode::deunicode;

/// Convert arbitrary text to a lower-case, dash-separated URL slug.
///
/// Non-ASCII characters are transliterated first, so `"Übersicht"` becomes
/// `"ubersicht"`. Returns an empty string when nothing usable remains.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode(text).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slugify every segment of a slash- or backslash-separated path.
///
/// Empty segments are dropped: `"Docs\\Getting Started"` gives
/// `"docs/getting-started"`.
pub fn slugify_path(text: &str) -> String {
    text.split(['/', '\\'])
        .map(slugify)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
