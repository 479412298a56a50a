//! pubstatic Generator Library
//!
//! Incremental build pipeline for pubstatic sites.
//!
//! # Modules
//!
//! - [`template`] - template backend with variable interpolation
//! - [`html`] - template contexts for pages and posts
//! - [`collector`] - source tree walking
//! - [`cache`] - build cache with content fingerprints
//! - [`assets`] - asset copying and LESS compilation
//! - [`robots`] - robots.txt and humans.txt
//! - [`build`] - stage orchestration
//! - [`create`] - new page and post creation

pub mod assets;
pub mod build;
pub mod cache;
pub mod collector;
pub mod create;
pub mod html;
pub mod robots;
pub mod template;

pub use build::{BuildError, BuildStats, Pipeline, SiteSources, Stage, StageError, StageStats, clean};
pub use cache::{BuildCache, CacheError, Fingerprint};
pub use create::{new_page, new_post};
pub use template::{RenderBackend, Template, TemplateContext, TemplateError, TemplateRegistry};
