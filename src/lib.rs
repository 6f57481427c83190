//! `dep-diff` — extract dependency records from the added lines of
//! dependency-file diffs.
//!
//! Given the patch text of a lock, checksum or requirements file, an
//! [`analyzer`] returns the `(ecosystem, name, version)` records introduced
//! by that patch, in line order and without deduplication. Selection is done
//! with [`analyzer::analyzer_for`]; unknown or disabled ecosystems yield no
//! analyzer at all.
//!
//! The remaining modules support running the analyzers over `git diff`
//! output: [`patch`] splits multi-file diffs, [`detector`] maps changed paths
//! to ecosystems using the [`config`], and [`report`] renders results.

pub mod analyzer;
pub mod config;
pub mod detector;
pub mod models;
pub mod patch;
pub mod report;

pub use analyzer::{analyzer_for, analyzer_for_name, Analyzer, EcosystemAnalyzer, ScanError};
pub use models::{Dependency, Ecosystem, FileDependencies};
