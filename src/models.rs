use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Package-manager domain a dependency record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Go,
    PyPi,
    None,
}

impl Ecosystem {
    /// Map an identifier to an ecosystem, ignoring case.
    ///
    /// Anything unrecognized maps to [`Ecosystem::None`], which callers treat as
    /// "skip extraction" rather than as an error.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "npm" => Ecosystem::Npm,
            "go" => Ecosystem::Go,
            "pypi" => Ecosystem::PyPi,
            _ => Ecosystem::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Go => "go",
            Ecosystem::PyPi => "pypi",
            Ecosystem::None => "none",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency introduced or changed by a diff.
///
/// An empty `version` means the diff did not pin one; rules that depend on the
/// version should treat the record as non-matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub ecosystem: Ecosystem,
    pub name: String,
    pub version: String,
}

impl Dependency {
    pub fn new(ecosystem: Ecosystem, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            ecosystem,
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }
}

/// Records extracted from the patch of a single changed file.
#[derive(Debug, Clone, Serialize)]
pub struct FileDependencies {
    /// Path of the changed file, when the diff carried one.
    pub path: Option<PathBuf>,
    pub ecosystem: Ecosystem,
    pub dependencies: Vec<Dependency>,
}
