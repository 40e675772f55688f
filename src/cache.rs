//! Cached version file for builds without source-control metadata.
//!
//! Source archives and installed trees usually ship without a `.git`
//! directory, so `git describe` has nothing to work with. This module
//! persists the last raw descriptor seen in a git checkout to a small
//! generated file that travels with the sources.
//!
//! # Format
//!
//! One assignment with a quoted string literal, readable by the package's
//! own runtime:
//!
//! ```text
//! __version__ = "v2.0.0-3-gdeadbee"
//! ```
//!
//! The stored value is the **raw** descriptor, never the normalized one.
//!
//! # Contract
//!
//! - Missing file → no cached value.
//! - File present but no `__version__ = "..."` line → [`CacheError::Malformed`].
//! - Writes overwrite the whole file and never create parent directories.
//! - Descriptors containing `"` or `'` are never written.

use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Default cache file name, relative to the project root.
pub const DEFAULT_CACHE_FILE: &str = "_version.py";

static VERSION_LINE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^__version__ = ['"]([^'"]*)['"]"#).unwrap());

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Unable to find version in {}", .path.display())]
    Malformed { path: PathBuf },
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle on the version cache file.
#[derive(Debug, Clone)]
pub struct VersionCache {
    path: PathBuf,
}

impl VersionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached raw descriptor.
    ///
    /// Returns `Ok(None)` if the file does not exist, including when a
    /// parent component is a regular file.
    pub fn load(&self) -> Result<Option<String>, CacheError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if is_missing_path(&e) => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        parse_version_line(content.trim())
            .map(|v| Some(v.to_string()))
            .ok_or_else(|| CacheError::Malformed {
                path: self.path.clone(),
            })
    }

    /// Overwrite the cache with `raw`.
    ///
    /// Descriptors containing a quote character can't be written without
    /// changing what reads back, so they fail with
    /// [`io::ErrorKind::InvalidInput`] and the file is left alone.
    pub fn store(&self, raw: &str) -> io::Result<()> {
        if raw.contains(['"', '\'']) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("descriptor {raw:?} contains a quote character"),
            ));
        }
        std::fs::write(&self.path, render_version_line(raw))
    }
}

/// Whether an I/O error means the cache file's location doesn't exist:
/// the file itself is missing or a parent component is not a directory.
pub fn is_missing_path(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Extract the quoted literal from a `__version__ = "..."` line.
fn parse_version_line(content: &str) -> Option<&str> {
    VERSION_LINE_REGEX
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn render_version_line(raw: &str) -> String {
    format!("__version__ = \"{raw}\"\n")
}
