//! # tagver
//!
//! Derive a package version from git tags, and keep deriving it after the
//! `.git` directory is gone.
//!
//! # How a Version Is Resolved
//!
//! ```text
//! 1. Describe   .git present  →  `git describe --tags`  →  v2.0.0-3-gdeadbee
//! 2. Cache      _version.py   →  __version__ = "v2.0.0-3-gdeadbee"
//! 3. Normalize  raw           →  2.0.0.post3+gdeadbee
//! ```
//!
//! A fresh descriptor from step 1 wins and is written back to the cache file
//! when it differs. Without source control the cached descriptor is used.
//! Without either, there is no version.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolve`] | Ties probe, cache, and normalization together |
//! | [`describe`] | Runs `git describe` with a deadline, classifies failures |
//! | [`cache`] | Reads and writes the `__version__ = "..."` cache file |
//! | [`normalize`] | Rewrites descriptors into PEP 440 post-release form |
//! | [`config`] | `tagver.toml` loading, validation, and merging |
//! | [`package`] | Static package descriptor that receives the version |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Cache Stores the Raw Descriptor
//!
//! `_version.py` holds exactly what `git describe` printed. Normalization
//! runs on every read, so the cache never has to be regenerated when the
//! normalization rules change.
//!
//! ## Only a Broken Cache Is Fatal
//!
//! A missing git binary, an untagged repository, or a read-only source tree
//! all degrade to the next fallback. A cache file that exists but can't be
//! parsed stops the build: shipping a package with the wrong version is
//! worse than not shipping it.
//!
//! ## Permissive Normalization
//!
//! Descriptors matching neither the bare release nor the
//! `vX.Y.Z-N-hash` shape pass through unchanged, even when the result is not
//! valid PEP 440. Rejecting them is left to the packaging tool.

pub mod cache;
pub mod config;
pub mod describe;
pub mod normalize;
pub mod output;
pub mod package;
pub mod resolve;

pub use resolve::{Resolution, Resolver, resolve_version};

#[cfg(test)]
pub(crate) mod test_helpers;
