//! Project configuration module.
//!
//! Handles loading, validating, and merging `tagver.toml`. Every key is
//! optional: stock defaults are overridden by whatever the project file sets.
//!
//! ## Config File Location
//!
//! `tagver.toml` lives in the project root, next to the `.git` directory:
//!
//! ```text
//! project/
//! ├── .git/
//! ├── tagver.toml              # Optional
//! ├── _version.py              # Generated cache file
//! └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! cache_file = "_version.py"   # Cache file, relative to the project root
//! metadata_dir = ".git"        # Probe only runs if this directory exists
//!
//! [describe]
//! program = "git"
//! args = ["describe", "--tags"]
//! timeout_secs = 10
//!
//! [package]                    # Optional package descriptor
//! name = "python-bioformats"
//! license = "GPL License"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::describe::{DEFAULT_TIMEOUT, GitDescribe};
use crate::package::PackageMetadata;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the project config file within the project root.
pub const CONFIG_FILENAME: &str = "tagver.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `tagver.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Version cache file, relative to the project root.
    pub cache_file: String,
    /// Source-control metadata directory, relative to the project root.
    pub metadata_dir: String,
    /// External describe command settings.
    pub describe: DescribeConfig,
    /// Package descriptor that receives the resolved version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageMetadata>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_file: crate::cache::DEFAULT_CACHE_FILE.to_string(),
            metadata_dir: ".git".to_string(),
            describe: DescribeConfig::default(),
            package: None,
        }
    }
}

impl ResolverConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cache_file must not be empty".into(),
            ));
        }
        if self.metadata_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "metadata_dir must not be empty".into(),
            ));
        }
        if self.describe.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "describe.program must not be empty".into(),
            ));
        }
        if self.describe.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "describe.timeout_secs must be greater than 0".into(),
            ));
        }
        if let Some(package) = &self.package {
            package
                .validate()
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
        Ok(())
    }

    pub fn cache_path(&self, root: &Path) -> PathBuf {
        root.join(&self.cache_file)
    }

    pub fn metadata_path(&self, root: &Path) -> PathBuf {
        root.join(&self.metadata_dir)
    }
}

/// External describe command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DescribeConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Seconds to wait before killing the command.
    pub timeout_secs: u64,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        let git = GitDescribe::default();
        Self {
            program: git.program,
            args: git.args,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl DescribeConfig {
    pub fn to_describer(&self) -> GitDescribe {
        GitDescribe {
            program: self.program.clone(),
            args: self.args.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ResolverConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ResolverConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResolverConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `tagver.toml` from the project root, falling back to defaults.
pub fn load_config(root: &Path) -> Result<ResolverConfig, ConfigError> {
    resolve_config(load_raw_config(&root.join(CONFIG_FILENAME))?)
}

/// Load an explicitly named config file. Unlike [`load_config`], a missing
/// file is an error.
pub fn load_config_file(path: &Path) -> Result<ResolverConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `tagver.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tagver Configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Version cache file, relative to the project root. Holds the last raw
# `git describe` output so source archives without .git still resolve.
# The parent directory must already exist.
cache_file = "_version.py"

# Source control is only consulted when this directory exists.
metadata_dir = ".git"

# ---------------------------------------------------------------------------
# Describe command
# ---------------------------------------------------------------------------
[describe]
program = "git"
# --tags includes lightweight (non-annotated) tags.
args = ["describe", "--tags"]
# The command is killed after this many seconds.
timeout_secs = 10

# ---------------------------------------------------------------------------
# Package descriptor (optional)
# ---------------------------------------------------------------------------
# Printed as JSON by `tagver metadata`, with `version` set to the resolved
# version. `version` itself cannot be set here.
#
# [package]
# name = "python-bioformats"
# author = "Lee Kamentsky"
# author_email = "leek@broadinstitute.org"
# description = "Read and write life sciences file formats"
# license = "GPL License"
# url = "http://github.com/CellProfiler/python-bioformats/"
# install_requires = ["future>=0.18.2", "javabridge"]
# packages = ["bioformats"]
# classifiers = [
#     "Development Status :: 5 - Production/Stable",
#     "Programming Language :: Python :: 3",
# ]
#
# [package.extras_require]
# test = ["pytest>=3.3.2,<4"]
# aws = ["boto3>=1.14.23"]
#
# [package.package_data]
# bioformats = ["jars/*.jar"]
"##
}
