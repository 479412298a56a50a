//! robots.txt and humans.txt generation.
//!
//! Both files are rendered from templates of the same name with the site
//! context and written to the build root.

use std::path::Path;

use pubstatic_core::Config;

use crate::{
    html::site_context,
    template::{RenderBackend, Result},
};

/// A generated text file without a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedFile {
    Robots,
    Humans,
}

impl GeneratedFile {
    /// File name, also the template name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Robots => "robots.txt",
            Self::Humans => "humans.txt",
        }
    }

    /// Output path relative to the build root.
    pub fn rel_dest(self) -> &'static Path {
        Path::new(self.name())
    }

    /// Render the file text.
    pub fn render(self, backend: &dyn RenderBackend, config: &Config) -> Result<String> {
        backend.render(self.name(), &site_context(config))
    }
}
