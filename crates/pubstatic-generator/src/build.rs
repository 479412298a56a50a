//! Build orchestration.
//!
//! A build runs a fixed sequence of stages against one [`BuildCache`]. Each
//! stage writes output only for stale units and records them in the cache;
//! the cache is committed after the last stage succeeds. Within a stage the
//! rendering fans out over rayon while the cache and the `processed` flags
//! are only touched from the calling thread.

use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    time::Instant,
};

use pubstatic_core::{
    AssetFile, BodyRenderer, Config, ContentUnit, CoreError, PageFile, Parseable, PostFile,
};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    assets::{self, AssetError},
    cache::{BuildCache, CacheError},
    collector,
    html::unit_context,
    robots::GeneratedFile,
    template::{RenderBackend, TemplateError, TemplateRegistry, template_files},
};

/// Errors raised inside a single stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Content unit error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Asset copy or output write error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Cache bookkeeping error.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Two units of one stage route to the same output path.
    #[error(
        "duplicate destination {}: {} and {}",
        dest.display(),
        first.display(),
        second.display()
    )]
    DuplicateDestination {
        dest: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Result type for stage operations.
pub type StageResult<T> = std::result::Result<T, StageError>;

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A stage failed; later stages did not run.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },

    /// Template loading error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be hashed.
    #[error("failed to hash configuration: {0}")]
    Context(#[from] serde_json::Error),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Css,
    Js,
    Less,
    Robots,
    Humans,
    Static,
    Pages,
    Posts,
}

impl Stage {
    /// Every stage, in the order a build runs them.
    pub const ALL: [Stage; 8] = [
        Self::Css,
        Self::Js,
        Self::Less,
        Self::Robots,
        Self::Humans,
        Self::Static,
        Self::Pages,
        Self::Posts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Less => "less",
            Self::Robots => "robots",
            Self::Humans => "humans",
            Self::Static => "static",
            Self::Pages => "pages",
            Self::Posts => "posts",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output counts of one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Units rendered or copied.
    pub written: usize,

    /// Units found up to date.
    pub skipped: usize,
}

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Per-stage counts in execution order.
    pub stages: Vec<(Stage, StageStats)>,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

impl BuildStats {
    pub fn written(&self) -> usize {
        self.stages.iter().map(|(_, s)| s.written).sum()
    }

    pub fn skipped(&self) -> usize {
        self.stages.iter().map(|(_, s)| s.skipped).sum()
    }

    /// Counts for `stage`, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<StageStats> {
        self.stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, stats)| *stats)
    }
}

/// Content units loaded during a build.
///
/// Each kind is collected the first time a stage needs it, so collection
/// failures are reported against that stage.
#[derive(Debug, Default)]
pub struct SiteSources {
    assets: Option<Vec<AssetFile>>,
    pages: Option<Vec<PageFile>>,
    posts: Option<Vec<PostFile>>,
}

/// The site build pipeline.
pub struct Pipeline {
    config: Config,
    backend: Box<dyn RenderBackend>,
    renderer: Box<dyn BodyRenderer>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline with templates from the configured directory and the
    /// configured Markdown renderer.
    pub fn new(config: Config) -> Result<Self> {
        let templates = TemplateRegistry::load_dir(&config.paths.templates)?;
        let renderer = pubstatic_parser::renderer_for(&config);
        Ok(Self::with_parts(config, Box::new(templates), Box::new(renderer)))
    }

    /// Pipeline with explicit backends.
    pub fn with_parts(
        config: Config,
        backend: Box<dyn RenderBackend>,
        renderer: Box<dyn BodyRenderer>,
    ) -> Self {
        Self {
            config,
            backend,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hash of everything that affects all output: configuration and
    /// template files.
    pub fn context_hash(&self) -> Result<String> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&serde_json::to_vec(&self.config)?);

        for (name, path) in template_files(&self.config.paths.templates) {
            hasher.update(name.as_bytes());
            hasher.update(&fs::read(&path)?);
        }

        Ok(hex::encode(hasher.finalize().as_bytes()))
    }

    /// Run every stage and commit the cache.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();
        info!(build = %self.config.paths.build.display(), "starting build");

        let context = self.context_hash()?;
        let mut cache = BuildCache::load(&self.config.paths.cache, &context);
        let mut sources = SiteSources::default();
        let mut stats = BuildStats::default();

        for stage in Stage::ALL {
            let stage_stats = self.run_stage(stage, &mut sources, &mut cache)?;
            stats.stages.push((stage, stage_stats));
        }

        if let Err(e) = cache.commit() {
            warn!(error = %e, "failed to save build cache");
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            written = stats.written(),
            skipped = stats.skipped(),
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Run a single stage.
    pub fn run_stage(
        &self,
        stage: Stage,
        sources: &mut SiteSources,
        cache: &mut BuildCache,
    ) -> Result<StageStats> {
        info!(%stage, "running stage");
        let stats = self
            .execute(stage, sources, cache)
            .map_err(|source| BuildError::Stage { stage, source })?;

        info!(
            %stage,
            written = stats.written,
            skipped = stats.skipped,
            "stage finished"
        );
        Ok(stats)
    }

    fn execute(
        &self,
        stage: Stage,
        sources: &mut SiteSources,
        cache: &mut BuildCache,
    ) -> StageResult<StageStats> {
        match stage {
            Stage::Css => self.copy_stage(sources, cache, |ext| ext == ".css"),
            Stage::Js => self.copy_stage(sources, cache, |ext| ext == ".js"),
            Stage::Less => self.less_stage(sources, cache),
            Stage::Robots => self.generated_stage(GeneratedFile::Robots, cache),
            Stage::Humans => self.generated_stage(GeneratedFile::Humans, cache),
            Stage::Static => self.copy_stage(sources, cache, |ext| {
                !matches!(ext, ".css" | ".js" | ".less")
            }),
            Stage::Pages => {
                let renderer = self.renderer.as_ref();
                if sources.pages.is_none() {
                    sources.pages = Some(collector::collect_pages(&self.config, renderer)?);
                }
                let pages: Vec<&mut PageFile> =
                    sources.pages.get_or_insert_with(Vec::new).iter_mut().collect();
                self.process_units(pages, cache, |page| self.render_unit(page))
            }
            Stage::Posts => {
                let renderer = self.renderer.as_ref();
                if sources.posts.is_none() {
                    sources.posts = Some(collector::collect_posts(&self.config, renderer)?);
                }
                let posts: Vec<&mut PostFile> =
                    sources.posts.get_or_insert_with(Vec::new).iter_mut().collect();
                self.process_units(posts, cache, |post| self.render_unit(post))
            }
        }
    }

    fn assets<'s>(&self, sources: &'s mut SiteSources) -> StageResult<&'s mut Vec<AssetFile>> {
        if sources.assets.is_none() {
            sources.assets = Some(collector::collect_assets(&self.config)?);
        }
        Ok(sources.assets.get_or_insert_with(Vec::new))
    }

    fn copy_stage(
        &self,
        sources: &mut SiteSources,
        cache: &mut BuildCache,
        accept: impl Fn(&str) -> bool,
    ) -> StageResult<StageStats> {
        let selected: Vec<&mut AssetFile> = self
            .assets(sources)?
            .iter_mut()
            .filter(|asset| accept(asset.source().ext()))
            .collect();

        self.process_units(selected, cache, |asset| {
            assets::copy_file(asset.source().path(), &asset.destination(&self.config))?;
            Ok(())
        })
    }

    fn less_stage(
        &self,
        sources: &mut SiteSources,
        cache: &mut BuildCache,
    ) -> StageResult<StageStats> {
        let command = self.config.assets.less_cmd.as_deref();
        let selected: Vec<&mut AssetFile> = self
            .assets(sources)?
            .iter_mut()
            .filter(|asset| asset.source().ext() == ".less")
            .collect();

        self.process_units(selected, cache, |asset| {
            let source = asset.source().path();
            assets::compile_less(command, source, &asset.destination(&self.config))
                .map_err(|e| CoreError::render(source, e.to_string()))?;
            Ok(())
        })
    }

    fn generated_stage(
        &self,
        file: GeneratedFile,
        cache: &mut BuildCache,
    ) -> StageResult<StageStats> {
        let text = file
            .render(self.backend.as_ref(), &self.config)
            .map_err(|e| CoreError::render(file.rel_dest(), e.to_string()))?;
        let dest = self.config.paths.build.join(file.rel_dest());

        if !cache.is_stale_generated(file.name(), &text, file.rel_dest(), &dest) {
            cache.keep_generated(file.name());
            debug!(dest = %dest.display(), "up to date");
            return Ok(StageStats {
                written: 0,
                skipped: 1,
            });
        }

        assets::write_output(&dest, &text)?;
        cache.record_generated(file.name(), &text, file.rel_dest());
        debug!(dest = %dest.display(), "wrote generated file");

        Ok(StageStats {
            written: 1,
            skipped: 0,
        })
    }

    fn render_unit<U: Parseable>(&self, unit: &U) -> StageResult<()> {
        let source = unit.source().path();
        let context = unit_context(&self.config, unit);
        let html = self
            .backend
            .render(&unit.metadata().template, &context)
            .map_err(|e| CoreError::render(source, e.to_string()))?;

        assets::write_output(&unit.destination(&self.config), &html)?;
        Ok(())
    }

    /// Write every stale unit with `write`, then record them in the cache.
    fn process_units<U, F>(
        &self,
        mut units: Vec<&mut U>,
        cache: &mut BuildCache,
        write: F,
    ) -> StageResult<StageStats>
    where
        U: ContentUnit,
        F: Fn(&U) -> StageResult<()> + Sync,
    {
        check_unique(units.iter().map(|unit| &**unit))?;

        let shared: &BuildCache = cache;
        let stale: Vec<bool> = units
            .par_iter()
            .map(|unit| !unit.processed() && shared.is_stale(&**unit, &self.config))
            .collect();

        units
            .par_iter()
            .zip(stale.par_iter())
            .filter(|(_, stale)| **stale)
            .map(|(unit, _)| write(&**unit))
            .collect::<StageResult<Vec<()>>>()?;

        let mut stats = StageStats::default();
        for (unit, stale) in units.iter_mut().zip(stale) {
            if stale {
                cache.record(&**unit)?;
                stats.written += 1;
                debug!(dest = %unit.rel_dest().display(), "wrote");
            } else {
                cache.keep(&**unit);
                stats.skipped += 1;
                debug!(dest = %unit.rel_dest().display(), "up to date");
            }
            unit.set_processed(true);
        }

        Ok(stats)
    }
}

fn check_unique<'a, U: ContentUnit + 'a>(units: impl Iterator<Item = &'a U>) -> StageResult<()> {
    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for unit in units {
        if let Some(first) = seen.insert(unit.rel_dest(), unit.source().path()) {
            return Err(StageError::DuplicateDestination {
                dest: unit.rel_dest().to_path_buf(),
                first: first.to_path_buf(),
                second: unit.source().path().to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Remove all generated output.
///
/// Returns whether there was anything to remove.
pub fn clean(build_path: &Path) -> std::io::Result<bool> {
    if !build_path.exists() {
        debug!(dir = %build_path.display(), "nothing to clean");
        return Ok(false);
    }

    fs::remove_dir_all(build_path)?;
    info!(dir = %build_path.display(), "removed build output");
    Ok(true)
}
