//! pubstatic Core Library
//!
//! Configuration, content units, front matter parsing, destination routing
//! and error handling for the pubstatic site generator.

pub mod config;
pub mod content;
pub mod error;
pub mod frontmatter;
pub mod route;
pub mod slug;

pub use config::Config;
pub use content::{AssetFile, ContentKind, ContentUnit, PageFile, Parseable, PostFile, SourceFile};
pub use error::{CoreError, Result};
pub use frontmatter::{BodyRenderer, FileDefaults, Metadata, Tag};
