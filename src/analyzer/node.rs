use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;

use super::{patch_lines, Analyzer, ScanError};
use crate::models::{Dependency, Ecosystem};

/// An added `"version": "x"` member, optionally followed by a comma.
static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\+\s*"version"\s*:\s*"([^"\n]*)"\s*(?:,|$)"#).expect("invalid version regex")
});

/// A quoted key opening an object, e.g. `"node_modules/@scope/pkg": {`.
static OBJECT_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s*"([^"]+)"\s*:\s*\{\s*"#).expect("invalid object key regex")
});

/// Analyzer for `package-lock.json` diffs.
///
/// A diff is not valid JSON, so the owning package of each added `"version"`
/// line is recovered by walking backward over the surrounding context and
/// counting braces until the enclosing object header is reached. This is a
/// heuristic over diff text: string values that themselves contain braces will
/// throw the count off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeAnalyzer;

impl NodeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn extract(&self, lines: &[String]) -> Vec<Dependency> {
        let mut deps = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let Some(caps) = VERSION_LINE.captures(line) else {
                continue;
            };

            // A version with no enclosing dependency key belongs to the root
            // project (or the repository's own package), not to a dependency.
            match find_dependency_name(&lines[..idx]) {
                Some(name) => deps.push(Dependency::new(Ecosystem::Npm, name, &caps[1])),
                None => tracing::debug!(line = idx + 1, "version line has no dependency key"),
            }
        }

        deps
    }
}

impl Analyzer for NodeAnalyzer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn analyze<R: BufRead>(&self, patch: R) -> Result<Vec<Dependency>, ScanError> {
        // The backward walk needs every earlier line, so buffer first.
        let mut lines = Vec::new();
        for line in patch_lines(patch) {
            match line {
                Ok(line) => lines.push(line),
                Err(source) => {
                    let partial = self.extract(&lines);
                    tracing::warn!(error = %source, extracted = partial.len(), "patch scan aborted");
                    return Err(ScanError { partial, source });
                }
            }
        }

        Ok(self.extract(&lines))
    }
}

/// Walk `preceding` from the end to the header of the innermost open object.
///
/// Every line holding a `}` closes a sibling object that must be skipped, so it
/// bumps the depth; a `{` at depth zero is the enclosing header, otherwise it
/// pairs off one skipped close.
fn find_dependency_name(preceding: &[String]) -> Option<String> {
    let mut depth = 0usize;

    for line in preceding.iter().rev() {
        if line.contains('}') {
            depth += 1;
        }
        if line.contains('{') {
            if depth == 0 {
                let caps = OBJECT_KEY.captures(line)?;
                return package_name(&caps[1]);
            }
            depth -= 1;
        }
    }

    None
}

/// Reduce a lockfile key such as `node_modules/a/node_modules/@scope/b` to
/// the package name (`@scope/b`). Keys with no name segment yield `None`.
fn package_name(key: &str) -> Option<String> {
    let mut segments = key.trim_end_matches('/').rsplit('/');
    let base = segments.next().filter(|base| !base.is_empty())?;

    match segments.next() {
        Some(scope) if scope.starts_with('@') => Some(format!("{scope}/{base}")),
        _ => Some(base.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::test_support::FailingReader;

    const LOCKFILE_V3_PATCH: &str = r#"@@ -1,20 +1,28 @@
 {
   "name": "my-app",
-  "version": "1.0.0",
+  "version": "1.1.0",
   "lockfileVersion": 3,
   "requires": true,
   "packages": {
     "": {
       "name": "my-app",
-      "version": "1.0.0",
+      "version": "1.1.0",
       "dependencies": {
         "@types/node": "^20.0.0",
         "express": "^4.18.2"
       }
     },
     "node_modules/@types/node": {
-      "version": "20.0.0",
+      "version": "20.1.4",
       "resolved": "https://registry.npmjs.org/@types/node/-/node-20.1.4.tgz",
       "dev": true
     },
+    "node_modules/express": {
+      "version": "4.18.2",
+      "resolved": "https://registry.npmjs.org/express/-/express-4.18.2.tgz",
+      "dependencies": {
+        "accepts": "~1.3.8"
+      },
+      "engines": {
+        "node": ">= 0.10.0"
+      }
+    },
"#;

    #[test]
    fn test_lockfile_v3_patch() {
        let deps = NodeAnalyzer::new().analyze_str(LOCKFILE_V3_PATCH);
        assert_eq!(
            deps,
            vec![
                Dependency::new(Ecosystem::Npm, "@types/node", "20.1.4"),
                Dependency::new(Ecosystem::Npm, "express", "4.18.2"),
            ]
        );
    }

    #[test]
    fn test_scoped_package_key() {
        let patch = r#"     "@scope/pkg": {
+      "version": "1.2.3",
       "resolved": "https://example.org/pkg.tgz"
"#;
        let deps = NodeAnalyzer::new().analyze_str(patch);
        assert_eq!(deps, vec![Dependency::new(Ecosystem::Npm, "@scope/pkg", "1.2.3")]);
    }

    #[test]
    fn test_root_project_version_is_ignored() {
        let patch = "@@ -1,4 +1,4 @@\n {\n   \"name\": \"my-app\",\n-  \"version\": \"1.0.0\",\n+  \"version\": \"1.1.0\",\n";
        assert!(NodeAnalyzer::new().analyze_str(patch).is_empty());
    }

    #[test]
    fn test_skips_closed_sibling_objects() {
        let patch = r#"     "node_modules/left-pad": {
       "dependencies": {
         "a": "1"
       },
       "engines": { "node": ">=4" },
+      "version": "1.3.0"
"#;
        let deps = NodeAnalyzer::new().analyze_str(patch);
        assert_eq!(deps, vec![Dependency::new(Ecosystem::Npm, "left-pad", "1.3.0")]);
    }

    #[test]
    fn test_version_without_trailing_comma() {
        let patch = "     \"node_modules/ms\": {\n+      \"version\": \"2.1.3\"\n";
        let deps = NodeAnalyzer::new().analyze_str(patch);
        assert_eq!(deps, vec![Dependency::new(Ecosystem::Npm, "ms", "2.1.3")]);
    }

    #[test]
    fn test_context_version_lines_are_ignored() {
        let patch = "     \"node_modules/ms\": {\n       \"version\": \"2.1.3\",\n";
        assert!(NodeAnalyzer::new().analyze_str(patch).is_empty());
    }

    #[test]
    fn test_repeated_entries_are_not_deduplicated() {
        let patch = r#"+    "node_modules/debug": {
+      "version": "4.3.4"
+    },
+    "node_modules/a/node_modules/debug": {
+      "version": "4.3.4"
+    },
"#;
        let deps = NodeAnalyzer::new().analyze_str(patch);
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| d.name == "debug" && d.version == "4.3.4"));
    }

    #[test]
    fn test_package_name() {
        assert_eq!(package_name("lodash").as_deref(), Some("lodash"));
        assert_eq!(package_name("node_modules/lodash").as_deref(), Some("lodash"));
        assert_eq!(package_name("@babel/core").as_deref(), Some("@babel/core"));
        assert_eq!(package_name("node_modules/@babel/core").as_deref(), Some("@babel/core"));
        assert_eq!(
            package_name("node_modules/a/node_modules/@scope/b").as_deref(),
            Some("@scope/b")
        );
        assert_eq!(package_name("/"), None);
        assert_eq!(package_name("///"), None);
        assert_eq!(package_name("node_modules/ms/").as_deref(), Some("ms"));
    }

    #[test]
    fn test_key_without_name_segment_is_ignored() {
        let patch = "    \"/\": {\n+      \"version\": \"1.0.0\"\n";
        assert!(NodeAnalyzer::new().analyze_str(patch).is_empty());
    }

    #[test]
    fn test_invalid_utf8_in_context_keeps_scanning() {
        let patch = b"     \"node_modules/ms\": {\n       \"description\": \"caf\xe9\",\n+      \"version\": \"2.1.3\"\n";
        let deps = NodeAnalyzer::new().analyze(&patch[..]).unwrap();
        assert_eq!(deps, vec![Dependency::new(Ecosystem::Npm, "ms", "2.1.3")]);
    }

    #[test]
    fn test_scan_fault_returns_records_read_so_far() {
        let err = NodeAnalyzer::new()
            .analyze(FailingReader::new(
                "     \"node_modules/ms\": {\n+      \"version\": \"2.1.3\"\n",
            ))
            .unwrap_err();
        assert_eq!(err.partial, vec![Dependency::new(Ecosystem::Npm, "ms", "2.1.3")]);
    }
}
