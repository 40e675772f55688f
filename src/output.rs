//! CLI output formatting for version resolution.
//!
//! # Output Format
//!
//! ```text
//! Version 2.0.0.post3+gdeadbee
//!     Source: git describe
//!     Raw: v2.0.0-3-gdeadbee
//!     Cache: _version.py (updated)
//! ```
//!
//! When source control is unavailable the probe line says why:
//!
//! ```text
//! Version 2.0.0 (release)
//!     Source: cache
//!     Raw: 2.0.0
//!     Cache: _version.py
//!     Probe: no source-control metadata directory
//! ```
//!
//! # Architecture
//!
//! `format_resolution` and `format_resolve` return `Vec<String>` for
//! testability and `print_resolve` writes to stdout. The format functions
//! are pure: no I/O, no side effects.
//!
//! With `--raw` the `resolve` subcommand prints the raw descriptor alone.
//! Otherwise `--quiet` prints the version alone and the default is the summary.

use crate::describe::DescribeOutcome;
use crate::normalize::is_release;
use crate::resolve::{Resolution, VersionSource};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn source_label(source: VersionSource) -> &'static str {
    match source {
        VersionSource::Describe => "git describe",
        VersionSource::Cache => "cache",
        VersionSource::None => "none",
    }
}

/// Show the cache path relative to the project root when possible.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format a resolution summary.
pub fn format_resolution(resolution: &Resolution, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    let ctx = indent(1);

    match &resolution.version {
        Some(v) if is_release(v) => lines.push(format!("Version {} (release)", v)),
        Some(v) => lines.push(format!("Version {}", v)),
        None => lines.push("Version unknown".to_string()),
    }

    lines.push(format!("{}Source: {}", ctx, source_label(resolution.source)));
    if let Some(raw) = &resolution.raw {
        lines.push(format!("{}Raw: {}", ctx, raw));
    }

    let cache = display_path(&resolution.cache_path, root);
    if resolution.cache_written {
        lines.push(format!("{}Cache: {} (updated)", ctx, cache));
    } else {
        lines.push(format!("{}Cache: {}", ctx, cache));
    }

    if let DescribeOutcome::Unavailable(reason) = &resolution.probe {
        lines.push(format!("{}Probe: {}", ctx, reason));
    }

    lines
}

/// What the `resolve` subcommand prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveDisplay {
    Summary,
    Version,
    Raw,
}

impl ResolveDisplay {
    /// `--raw` wins over `--quiet`.
    pub fn from_flags(raw: bool, quiet: bool) -> Self {
        if raw {
            ResolveDisplay::Raw
        } else if quiet {
            ResolveDisplay::Version
        } else {
            ResolveDisplay::Summary
        }
    }
}

/// Format the `resolve` subcommand's output. Absent values print as `none`.
pub fn format_resolve(resolution: &Resolution, root: &Path, display: ResolveDisplay) -> Vec<String> {
    let value = match display {
        ResolveDisplay::Summary => return format_resolution(resolution, root),
        ResolveDisplay::Version => resolution.version.as_deref(),
        ResolveDisplay::Raw => resolution.raw.as_deref(),
    };
    vec![value.unwrap_or("none").to_string()]
}

pub fn print_resolve(resolution: &Resolution, root: &Path, display: ResolveDisplay) {
    for line in format_resolve(resolution, root, display) {
        println!("{}", line);
    }
}
