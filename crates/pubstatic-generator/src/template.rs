//! Template backend.
//!
//! Templates use plain variable interpolation: `{{ name }}` is replaced by a
//! context value and fails when the value is missing, `{{ name? }}` renders
//! empty instead. Built-in templates cover every name the build needs and
//! can be overridden by files in the site's template directory.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable '{variable}' in template '{template}'")]
    MissingVariable { template: String, variable: String },

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax in '{template}': {message}")]
    InvalidSyntax { template: String, message: String },

    /// Failed to read a template file.
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// A named template source.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Render the template with the given context.
    ///
    /// Substituted values are never rescanned for placeholders.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| TemplateError::InvalidSyntax {
                template: self.name.clone(),
                message: "unclosed {{ delimiter".to_string(),
            })?;

            let var = after[..end].trim();
            let (var, optional) = match var.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (var, false),
            };

            match context.get(var) {
                Some(value) => out.push_str(value),
                None if optional => {}
                None => {
                    return Err(TemplateError::MissingVariable {
                        template: self.name.clone(),
                        variable: var.to_string(),
                    });
                }
            }

            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Renders named templates for the build stages.
pub trait RenderBackend: Send + Sync {
    /// Render the template called `name` with `context`.
    fn render(&self, name: &str, context: &TemplateContext) -> Result<String>;
}

/// Registry of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a registry holding the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Template::new("page", DEFAULT_PAGE_TEMPLATE));
        registry.register(Template::new("post", DEFAULT_POST_TEMPLATE));
        registry.register(Template::new("robots.txt", DEFAULT_ROBOTS_TEMPLATE));
        registry.register(Template::new("humans.txt", DEFAULT_HUMANS_TEMPLATE));
        registry
    }

    /// Built-in templates overridden by every file found under `dir`.
    ///
    /// A missing directory leaves the built-ins in place.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();
        for (name, path) in template_files(dir) {
            let content = fs::read_to_string(&path).map_err(|source| TemplateError::Read {
                path: path.clone(),
                source,
            })?;
            debug!(name = %name, path = %path.display(), "loaded template");
            registry.register(Template::new(name, content));
        }
        Ok(registry)
    }

    /// Register a template, replacing one of the same name.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Registered template names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl RenderBackend for TemplateRegistry {
    fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
            .render(context)
    }
}

/// Template files under `dir`, keyed by template name and sorted.
///
/// `.html` files are named by their relative path without the extension;
/// other files keep their full relative path (`robots.txt`).
pub fn template_files(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(dir).ok()?;
            let name = if rel.extension().is_some_and(|x| x == "html") {
                rel.with_extension("")
            } else {
                rel.to_path_buf()
            };
            let name = name
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some((name, e.into_path()))
        })
        .collect();

    files.sort();
    files
}

/// Default page template.
pub const DEFAULT_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} | {{ site_title }}</title>
    <meta name="author" content="{{ author? }}">
    <link rel="canonical" href="{{ full_url }}">
</head>
<body>
    <header><a href="{{ rel_root_url }}">{{ site_title }}</a></header>
    <main>
        <article class="page">
            <h1>{{ title }}</h1>
            {{ content }}
        </article>
    </main>
</body>
</html>
"#;

/// Default post template.
pub const DEFAULT_POST_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }} | {{ site_title }}</title>
    <meta name="author" content="{{ author? }}">
    <link rel="canonical" href="{{ full_url }}">
</head>
<body>
    <header><a href="{{ rel_root_url }}">{{ site_title }}</a></header>
    <main>
        <article class="post">
            <h1>{{ title }}</h1>
            <time datetime="{{ created_iso }}">{{ created }}</time>
            {{ tags_html? }}
            {{ content }}
            {{ source_link? }}
        </article>
    </main>
</body>
</html>
"#;

/// Default robots.txt template.
pub const DEFAULT_ROBOTS_TEMPLATE: &str = "User-agent: *\nAllow: /\n";

/// Default humans.txt template.
pub const DEFAULT_HUMANS_TEMPLATE: &str = "/* TEAM */
Author: {{ author? }}
Site: {{ root_url }}

/* SITE */
Title: {{ site_title }}
Software: pubstatic
";
