use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;

use super::{scan_lines, Analyzer, ScanError};
use crate::models::{Dependency, Ecosystem};

/// An `(operator, version)` constraint pair. Longer operators come first so
/// `===` is never read as `==`.
static CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(===|==|!=|~=|>=|<=|>|<)\s*([0-9][0-9A-Za-z.*+!_-]*)")
        .expect("invalid constraint regex")
});

/// Any comparison operator; the package name ends where the first one starts.
static OPERATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===|==|!=|~=|>=|<=|>|<").expect("invalid operator regex"));

static NAME_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("invalid separator regex"));

/// Operators that pin down the lowest acceptable version.
const LOWER_BOUND_OPERATORS: &[&str] = &[">", ">=", "==", "==="];

/// Analyzer for `requirements.txt` diffs.
///
/// A line without any version constraint is still reported, with an empty
/// version, so that callers see the package even though it is unpinned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PythonAnalyzer;

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for PythonAnalyzer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::PyPi
    }

    fn analyze<R: BufRead>(&self, patch: R) -> Result<Vec<Dependency>, ScanError> {
        scan_lines(patch, parse_line)
    }
}

fn parse_line(line: &str) -> Option<Dependency> {
    let line = added_requirement(line)?;

    let constraints: Vec<(&str, &str)> = CONSTRAINT
        .captures_iter(line)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();

    if constraints.is_empty() {
        return Some(make_dep(line, ""));
    }

    // Prefer the last explicit lower bound; otherwise the first version seen.
    let version = constraints
        .iter()
        .rev()
        .find(|(op, _)| LOWER_BOUND_OPERATORS.contains(op))
        .or_else(|| constraints.first())
        .map(|(_, version)| *version)
        .unwrap_or_default();

    let name_end = OPERATOR.find(line).map_or(line.len(), |m| m.start());
    let name = line[..name_end].trim();
    if name.is_empty() {
        return None;
    }

    Some(make_dep(name, version))
}

/// Strip the added-line marker and any inline comment.
///
/// Returns `None` for lines that are not additions or carry no requirement
/// (blank, comment-only, or a pip option such as `-r base.txt`).
fn added_requirement(line: &str) -> Option<&str> {
    let line = line.trim().strip_prefix('+')?;
    let line = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let line = line.trim();

    if line.is_empty() || line.starts_with('-') {
        return None;
    }
    Some(line)
}

fn make_dep(name: &str, version: &str) -> Dependency {
    Dependency::new(Ecosystem::PyPi, normalize_name(name), version)
}

/// Normalize a distribution name: runs of `-`, `_` and `.` become a single
/// `-`, and the result is lowercased.
pub fn normalize_name(name: &str) -> String {
    NAME_SEPARATORS.replace_all(name, "-").to_lowercase()
}
