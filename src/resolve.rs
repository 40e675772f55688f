//! Version resolution: source control first, cache file second.
//!
//! ```text
//! metadata dir present? ──yes──▶ describe ──Found──┐
//!          │                        │              │
//!          no                  Unavailable         ▼
//!          │                        │      differs from cache? ──yes──▶ rewrite cache
//!          ▼                        ▼              │
//!        cache file ◀───────────────┘              │
//!          │                                       │
//!          ▼                                       ▼
//!      raw = descriptor.or(cached) ──▶ normalize ──▶ version
//! ```
//!
//! Only a malformed cache file stops resolution. Probe failures, cache
//! writes into a missing directory, and descriptors the cache format can't
//! hold are logged and skipped, and a project
//! with neither source control nor a cache resolves to no version at all.

use crate::cache::{CacheError, VersionCache, is_missing_path};
use crate::config::ResolverConfig;
use crate::describe::{Describe, DescribeOutcome, Unavailable};
use crate::normalize::normalize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Unable to write version file {}: {source}", .path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the effective raw descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Describe,
    Cache,
    None,
}

/// Everything learned while resolving a version.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Effective raw descriptor, before normalization.
    pub raw: Option<String>,
    /// Normalized version.
    pub version: Option<String>,
    pub source: VersionSource,
    /// Whether the cache file was rewritten during this resolution.
    pub cache_written: bool,
    pub cache_path: PathBuf,
    pub probe: DescribeOutcome,
}

pub struct Resolver {
    root: PathBuf,
    metadata_dir: PathBuf,
    cache: VersionCache,
    describer: Box<dyn Describe>,
}

impl Resolver {
    pub fn new(root: &Path, config: &ResolverConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            metadata_dir: config.metadata_path(root),
            cache: VersionCache::new(config.cache_path(root)),
            describer: Box::new(config.describe.to_describer()),
        }
    }

    /// Replace the source-control probe.
    pub fn with_describer(mut self, describer: impl Describe + 'static) -> Self {
        self.describer = Box::new(describer);
        self
    }

    pub fn resolve(&self) -> Result<Resolution, ResolveError> {
        let probe = self.probe();
        let cached = self.cache.load()?;

        let mut cache_written = false;
        if let Some(fresh) = probe.descriptor()
            && cached.as_deref() != Some(fresh)
        {
            cache_written = self.update_cache(fresh)?;
        }

        let (raw, source) = match (probe.descriptor(), cached) {
            (Some(fresh), _) => (Some(fresh.to_string()), VersionSource::Describe),
            (None, Some(cached)) => (Some(cached), VersionSource::Cache),
            (None, None) => (None, VersionSource::None),
        };
        let version = normalize(raw.as_deref());
        debug!(?raw, ?version, ?source, "resolved version");

        Ok(Resolution {
            raw,
            version,
            source,
            cache_written,
            cache_path: self.cache.path().to_path_buf(),
            probe,
        })
    }

    fn probe(&self) -> DescribeOutcome {
        // `exists` rather than `is_dir`: worktrees and submodules use a `.git` file.
        if !self.metadata_dir.exists() {
            debug!(path = %self.metadata_dir.display(), "no source-control metadata, skipping describe");
            return DescribeOutcome::Unavailable(Unavailable::NoMetadataDir);
        }
        let outcome = self.describer.describe(&self.root);
        match &outcome {
            DescribeOutcome::Found(descriptor) => debug!(%descriptor, "describe succeeded"),
            DescribeOutcome::Unavailable(reason) => {
                info!(%reason, "could not get version from source control")
            }
        }
        outcome
    }

    /// Returns whether the cache was written. A missing parent directory or
    /// an unstorable descriptor is skipped; any other write error is fatal.
    fn update_cache(&self, fresh: &str) -> Result<bool, ResolveError> {
        match self.cache.store(fresh) {
            Ok(()) => {
                info!(path = %self.cache.path().display(), descriptor = %fresh, "updated version file");
                Ok(true)
            }
            Err(e) if is_missing_path(&e) => {
                info!(path = %self.cache.path().display(), error = %e, "Unable to create version file, skipping");
                Ok(false)
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                info!(path = %self.cache.path().display(), error = %e, "Descriptor can't be cached, skipping");
                Ok(false)
            }
            Err(source) => Err(ResolveError::CacheWrite {
                path: self.cache.path().to_path_buf(),
                source,
            }),
        }
    }
}

/// Resolve the normalized version for the project at `root`.
pub fn resolve_version(root: &Path, config: &ResolverConfig) -> Result<Option<String>, ResolveError> {
    Ok(Resolver::new(root, config).resolve()?.version)
}
