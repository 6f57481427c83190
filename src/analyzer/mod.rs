//! Ecosystem-specific diff analyzers.
//!
//! Each analyzer reads the patch text of one dependency file and returns the
//! dependencies found on its added (`+`) lines, in the order they appear:
//!
//! - [`node`] — `package-lock.json` trees
//! - [`go`] — `go.sum` checksum lines
//! - [`python`] — `requirements.txt` constraints

use std::io::{self, BufRead};

use thiserror::Error;

use crate::models::{Dependency, Ecosystem};

pub mod go;
pub mod node;
pub mod python;

pub use go::GoAnalyzer;
pub use node::NodeAnalyzer;
pub use python::PythonAnalyzer;

/// Reading the patch failed part-way through.
///
/// Records extracted before the fault are kept in `partial`; callers must not
/// assume an all-or-nothing result.
#[derive(Debug, Error)]
#[error("failed to read patch ({} dependencies extracted before the fault): {source}", .partial.len())]
pub struct ScanError {
    pub partial: Vec<Dependency>,
    #[source]
    pub source: io::Error,
}

impl ScanError {
    pub fn into_parts(self) -> (Vec<Dependency>, io::Error) {
        (self.partial, self.source)
    }
}

pub trait Analyzer {
    /// Ecosystem stamped on every record this analyzer emits.
    fn ecosystem(&self) -> Ecosystem;

    /// Extract dependencies from the added lines of `patch`.
    ///
    /// Lines that do not match are skipped silently; only a read fault on
    /// `patch` produces an error.
    fn analyze<R: BufRead>(&self, patch: R) -> Result<Vec<Dependency>, ScanError>;

    /// Extract dependencies from an in-memory patch, which cannot fault.
    fn analyze_str(&self, patch: &str) -> Vec<Dependency> {
        self.analyze(patch.as_bytes())
            .unwrap_or_else(|err| err.partial)
    }
}

/// The closed set of supported analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcosystemAnalyzer {
    Node(NodeAnalyzer),
    Go(GoAnalyzer),
    Python(PythonAnalyzer),
}

impl Analyzer for EcosystemAnalyzer {
    fn ecosystem(&self) -> Ecosystem {
        match self {
            EcosystemAnalyzer::Node(a) => a.ecosystem(),
            EcosystemAnalyzer::Go(a) => a.ecosystem(),
            EcosystemAnalyzer::Python(a) => a.ecosystem(),
        }
    }

    fn analyze<R: BufRead>(&self, patch: R) -> Result<Vec<Dependency>, ScanError> {
        match self {
            EcosystemAnalyzer::Node(a) => a.analyze(patch),
            EcosystemAnalyzer::Go(a) => a.analyze(patch),
            EcosystemAnalyzer::Python(a) => a.analyze(patch),
        }
    }
}

/// Select the analyzer for `ecosystem`.
///
/// `None` is the no-op outcome: the ecosystem is disabled or unknown and
/// extraction should be skipped. It is not an error.
pub fn analyzer_for(ecosystem: Ecosystem) -> Option<EcosystemAnalyzer> {
    match ecosystem {
        Ecosystem::Npm => Some(EcosystemAnalyzer::Node(NodeAnalyzer::new())),
        Ecosystem::Go => Some(EcosystemAnalyzer::Go(GoAnalyzer::new())),
        // Only requirements-style files are understood for PyPI.
        Ecosystem::PyPi => Some(EcosystemAnalyzer::Python(PythonAnalyzer::new())),
        Ecosystem::None => {
            tracing::debug!("no analyzer for ecosystem `none`, skipping extraction");
            None
        }
    }
}

/// Select the analyzer for a case-insensitive ecosystem identifier.
pub fn analyzer_for_name(name: &str) -> Option<EcosystemAnalyzer> {
    analyzer_for(Ecosystem::from_name(name))
}

/// Feed every line of `patch` to `visit`, collecting what it returns.
///
/// On a read fault the records gathered so far travel with the error.
fn scan_lines<R, F>(patch: R, mut visit: F) -> Result<Vec<Dependency>, ScanError>
where
    R: BufRead,
    F: FnMut(&str) -> Option<Dependency>,
{
    let mut deps = Vec::new();

    for line in patch_lines(patch) {
        match line {
            Ok(line) => deps.extend(visit(&line)),
            Err(source) => {
                tracing::warn!(error = %source, extracted = deps.len(), "patch scan aborted");
                return Err(ScanError {
                    partial: deps,
                    source,
                });
            }
        }
    }

    Ok(deps)
}

/// Lines of a patch split on `\n`, with a trailing `\r` dropped.
///
/// Bytes that are not UTF-8 are replaced rather than reported, so only real
/// read faults surface as errors.
pub(crate) struct PatchLines<R> {
    reader: R,
    buf: Vec<u8>,
}

pub(crate) fn patch_lines<R: BufRead>(reader: R) -> PatchLines<R> {
    PatchLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for PatchLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
