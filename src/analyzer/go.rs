use std::io::BufRead;

use super::{scan_lines, Analyzer, ScanError};
use crate::models::{Dependency, Ecosystem};

/// Suffix of the `go.sum` entry that only hashes a module's `go.mod`.
const GO_MOD_SUFFIX: &str = "/go.mod";

/// Analyzer for `go.sum` diffs.
///
/// Each module version normally adds two lines, one hashing the module tree
/// and one hashing only its `go.mod`. The `go.mod` line is dropped so a pair
/// yields one record; a lone tree line still yields one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GoAnalyzer;

impl GoAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for GoAnalyzer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    fn analyze<R: BufRead>(&self, patch: R) -> Result<Vec<Dependency>, ScanError> {
        scan_lines(patch, parse_line)
    }
}

fn parse_line(line: &str) -> Option<Dependency> {
    let added = line.strip_prefix('+')?;
    // The module path must follow the marker directly.
    if added.starts_with(char::is_whitespace) {
        return None;
    }

    let fields: Vec<&str> = added.split_whitespace().collect();
    if fields.len() < 3 || fields[1].ends_with(GO_MOD_SUFFIX) {
        return None;
    }

    Some(Dependency::new(Ecosystem::Go, fields[0], fields[1]))
}
