//! Declarative package descriptor.
//!
//! Everything about a package except its version is static: name, author,
//! license, dependency lists, classifiers, package data globs, entry points.
//! This module holds that metadata (read from the `[package]` table of
//! `tagver.toml`) and pairs it with the resolved version for output.
//!
//! The version cannot be set in the config file. It always comes from
//! [`crate::resolve`], and an unresolvable version is emitted as `null`
//! rather than made up.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("no [package] table in config")]
    Missing,
    #[error("package validation error: {0}")]
    Validation(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Static package metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub install_requires: Vec<String>,
    /// Optional dependency groups, e.g. `test = ["pytest>=3.3.2,<4"]`.
    pub extras_require: BTreeMap<String, Vec<String>>,
    pub classifiers: Vec<String>,
    pub packages: Vec<String>,
    /// Per-package data file globs, e.g. `bioformats = ["jars/*.jar"]`.
    pub package_data: BTreeMap<String, Vec<String>>,
    /// Entry point groups, e.g. `console_scripts = ["tool = pkg.cli:main"]`.
    pub entry_points: BTreeMap<String, Vec<String>>,
}

impl PackageMetadata {
    pub fn validate(&self) -> Result<(), PackageError> {
        if self.name.trim().is_empty() {
            return Err(PackageError::Validation(
                "package.name must not be empty".into(),
            ));
        }
        if let Some((package, _)) = self
            .package_data
            .iter()
            .find(|(_, globs)| globs.iter().any(|g| g.trim().is_empty()))
        {
            return Err(PackageError::Validation(format!(
                "package.package_data.{package} contains an empty glob"
            )));
        }
        Ok(())
    }

    /// Pair this metadata with a resolved version.
    pub fn with_version(&self, version: Option<String>) -> PackageDescriptor<'_> {
        PackageDescriptor {
            version,
            metadata: self,
        }
    }
}

/// Package metadata plus its resolved version, as emitted by `tagver metadata`.
#[derive(Debug, Serialize)]
pub struct PackageDescriptor<'a> {
    pub version: Option<String>,
    #[serde(flatten)]
    pub metadata: &'a PackageMetadata,
}

impl PackageDescriptor<'_> {
    pub fn to_json_pretty(&self) -> Result<String, PackageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
