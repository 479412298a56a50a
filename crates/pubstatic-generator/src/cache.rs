//! Build cache.
//!
//! Remembers, per source file, the fingerprint and destination recorded
//! after its output was last written. A unit whose fingerprint, destination
//! or output file changed since then is stale and gets rebuilt.
//!
//! The whole cache is invalidated when the format version or the site
//! context hash (configuration and templates) differs from the one stored.
//! Load problems never fail a build: they are logged and the cache starts
//! empty, which means a full rebuild.
//!
//! Only entries recorded or kept during the current run are committed, so
//! sources that were deleted or renamed drop out of the cache.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use pubstatic_core::{Config, ContentUnit};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Cache file format version.
pub const CACHE_VERSION: u32 = 1;

/// Cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed cache file.
    #[error("invalid cache data: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored version or context hash does not match.
    #[error("cache is outdated")]
    Outdated,
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Identity of a source file's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Modification time in nanoseconds since the epoch.
    pub mtime_ns: u64,
    /// Hex-encoded blake3 hash of the content.
    pub hash: String,
}

impl Fingerprint {
    /// Fingerprint a file on disk.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let bytes = fs::read(path)?;
        let mtime_ns = fs::metadata(path)?
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));

        Ok(Self {
            mtime_ns,
            hash: hash_bytes(&bytes),
        })
    }

    /// Fingerprint generated text that has no source file.
    pub fn of_text(text: &str) -> Self {
        Self {
            mtime_ns: 0,
            hash: hash_bytes(text.as_bytes()),
        }
    }
}

/// Hex-encoded blake3 digest.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CacheEntry {
    fingerprint: Fingerprint,
    rel_dest: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    context: String,
    entries: BTreeMap<String, CacheEntry>,
}

/// Cache of previously written output.
#[derive(Debug)]
pub struct BuildCache {
    path: PathBuf,
    context: String,
    entries: BTreeMap<String, CacheEntry>,
    live: BTreeSet<String>,
}

impl BuildCache {
    /// An empty cache persisted to `path`.
    pub fn empty(path: impl Into<PathBuf>, context: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            context: context.into(),
            entries: BTreeMap::new(),
            live: BTreeSet::new(),
        }
    }

    /// Load the cache stored at `path` for the given site context.
    ///
    /// Any failure yields an empty cache.
    pub fn load(path: &Path, context: &str) -> Self {
        match Self::read(path, context) {
            Ok(entries) => {
                debug!(path = %path.display(), entries = entries.len(), "loaded build cache");
                Self {
                    path: path.to_path_buf(),
                    context: context.to_string(),
                    entries,
                    live: BTreeSet::new(),
                }
            }
            Err(CacheError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no build cache, starting fresh");
                Self::empty(path, context)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding build cache");
                Self::empty(path, context)
            }
        }
    }

    fn read(path: &Path, context: &str) -> Result<BTreeMap<String, CacheEntry>> {
        let data = fs::read(path)?;
        let file: CacheFile = serde_json::from_slice(&data)?;
        if file.version != CACHE_VERSION || file.context != context {
            return Err(CacheError::Outdated);
        }
        Ok(file.entries)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `unit` needs to be rebuilt.
    pub fn is_stale(&self, unit: &dyn ContentUnit, config: &Config) -> bool {
        let source = unit.source().path();
        let Some(entry) = self.entries.get(&source_key(source)) else {
            return true;
        };

        match Fingerprint::of_file(source) {
            Ok(current) => {
                current != entry.fingerprint
                    || entry.rel_dest != unit.rel_dest()
                    || !unit.destination(config).is_file()
            }
            Err(_) => true,
        }
    }

    /// Record `unit` as written with its current fingerprint.
    pub fn record(&mut self, unit: &dyn ContentUnit) -> Result<()> {
        let source = unit.source().path();
        let fingerprint = Fingerprint::of_file(source)?;
        let key = source_key(source);
        self.entries.insert(
            key.clone(),
            CacheEntry {
                fingerprint,
                rel_dest: unit.rel_dest().to_path_buf(),
            },
        );
        self.live.insert(key);
        Ok(())
    }

    /// Keep the entry of an up to date `unit` in the next commit.
    pub fn keep(&mut self, unit: &dyn ContentUnit) {
        self.live.insert(source_key(unit.source().path()));
    }

    /// Whether the generated file `name` needs to be written.
    pub fn is_stale_generated(&self, name: &str, text: &str, rel_dest: &Path, dest: &Path) -> bool {
        match self.entries.get(&generated_key(name)) {
            Some(entry) => {
                entry.fingerprint != Fingerprint::of_text(text)
                    || entry.rel_dest != rel_dest
                    || !dest.is_file()
            }
            None => true,
        }
    }

    /// Record the generated file `name` as written.
    pub fn record_generated(&mut self, name: &str, text: &str, rel_dest: &Path) {
        self.entries.insert(
            generated_key(name),
            CacheEntry {
                fingerprint: Fingerprint::of_text(text),
                rel_dest: rel_dest.to_path_buf(),
            },
        );
        self.live.insert(generated_key(name));
    }

    /// Keep the entry of the up to date generated file `name`.
    pub fn keep_generated(&mut self, name: &str) {
        self.live.insert(generated_key(name));
    }

    /// Persist the entries recorded or kept during this run, replacing the
    /// previous file atomically.
    pub fn commit(&self) -> Result<()> {
        let entries: BTreeMap<_, _> = self
            .entries
            .iter()
            .filter(|(key, _)| self.live.contains(*key))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        let pruned = self.entries.len() - entries.len();
        let file = CacheFile {
            version: CACHE_VERSION,
            context: self.context.clone(),
            entries,
        };
        let json = serde_json::to_vec_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            entries = file.entries.len(),
            pruned,
            "committed build cache"
        );
        Ok(())
    }
}

fn source_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn generated_key(name: &str) -> String {
    format!("generated:{name}")
}
