//! Splitting multi-file unified diffs into per-file patches.
//!
//! Analyzers expect the hunk text of a single file. `git diff` output carries
//! several files plus headers (`diff --git`, `index`, `---`/`+++`), and a
//! `+++ b/path` header would otherwise read as an added line.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -\d+(?:,(\d+))? \+\d+(?:,(\d+))? @@").expect("invalid hunk header regex")
});

/// Extended header lines `git diff` emits between `diff --git` and `---`.
const GIT_HEADER_PREFIXES: &[&str] = &[
    "index ",
    "old mode ",
    "new mode ",
    "deleted file mode ",
    "new file mode ",
    "similarity index ",
    "dissimilarity index ",
    "rename from ",
    "rename to ",
    "copy from ",
    "copy to ",
    "Binary files ",
];

/// The hunk text of one changed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePatch {
    /// Post-image path; `None` when the input carried no file headers.
    pub path: Option<PathBuf>,
    pub body: String,
}

impl FilePatch {
    fn push_line(&mut self, line: &str) {
        self.body.push_str(line);
        self.body.push('\n');
    }
}

/// Lines still expected in the current hunk, as (old side, new side).
#[derive(Debug, Default, Clone, Copy)]
struct HunkRemaining {
    old: usize,
    new: usize,
}

impl HunkRemaining {
    fn parse(header: &str) -> Option<Self> {
        let caps = HUNK_HEADER.captures(header)?;
        let count = |idx: usize| {
            caps.get(idx)
                .map_or(Some(1), |m| m.as_str().parse().ok())
        };
        Some(Self {
            old: count(1)?,
            new: count(2)?,
        })
    }

    fn is_open(&self) -> bool {
        self.old > 0 || self.new > 0
    }

    fn consume(&mut self, line: &str) {
        match line.as_bytes().first() {
            Some(b'+') => self.new = self.new.saturating_sub(1),
            Some(b'-') => self.old = self.old.saturating_sub(1),
            Some(b'\\') => {}
            _ => {
                self.old = self.old.saturating_sub(1);
                self.new = self.new.saturating_sub(1);
            }
        }
    }
}

/// Split `input` into one [`FilePatch`] per changed file, in input order.
///
/// Input without any file headers comes back as a single patch with no path.
pub fn split_patches(input: &str) -> Vec<FilePatch> {
    let mut patches = Vec::new();
    let mut current = FilePatch::default();
    let mut hunk = HunkRemaining::default();
    let mut in_git_header = false;
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        if hunk.is_open() {
            hunk.consume(line);
            current.push_line(line);
            continue;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush(&mut patches, &mut current);
            current.path = git_header_path(rest);
            in_git_header = true;
            continue;
        }

        if line.starts_with("--- ") {
            if let Some(next) = lines.peek().and_then(|l| l.strip_prefix("+++ ")) {
                if !in_git_header {
                    flush(&mut patches, &mut current);
                }
                let old = header_path(&line[4..]);
                current.path = header_path(next).or(old).or(current.path.take());
                in_git_header = false;
                lines.next();
                continue;
            }
        }

        if in_git_header && GIT_HEADER_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        if line.starts_with("@@") {
            in_git_header = false;
            if let Some(parsed) = HunkRemaining::parse(line) {
                hunk = parsed;
            }
        }

        current.push_line(line);
    }

    flush(&mut patches, &mut current);
    patches
}

fn flush(patches: &mut Vec<FilePatch>, current: &mut FilePatch) {
    let patch = std::mem::take(current);
    if patch.path.is_some() || !patch.body.is_empty() {
        patches.push(patch);
    }
}

/// Path from a `---`/`+++` header, without the `a/`/`b/` prefix or a
/// trailing timestamp. `/dev/null` has no path.
fn header_path(header: &str) -> Option<PathBuf> {
    let path = header.split('\t').next().unwrap_or(header).trim();
    if path.is_empty() || path == "/dev/null" {
        return None;
    }
    let path = path
        .strip_prefix("b/")
        .or_else(|| path.strip_prefix("a/"))
        .unwrap_or(path);
    Some(PathBuf::from(path))
}

/// Post-image path from the remainder of a `diff --git a/X b/Y` line.
fn git_header_path(rest: &str) -> Option<PathBuf> {
    let idx = rest.rfind(" b/")?;
    Some(PathBuf::from(&rest[idx + 3..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIT_DIFF: &str = "diff --git a/go.sum b/go.sum
index 3b1c2a1..9f0e4d2 100644
--- a/go.sum
+++ b/go.sum
@@ -1,2 +1,3 @@
 github.com/davecgh/go-spew v1.1.1 h1:vj9j=
+example.org/mod v0.3.7 h1:UHqV=
 github.com/davecgh/go-spew v1.1.1/go.mod h1:J7Y8=
diff --git a/requirements.txt b/requirements.txt
new file mode 100644
index 0000000..e69de29
--- /dev/null
+++ b/requirements.txt
@@ -0,0 +1,2 @@
+Django>=3.2,<4.0
+flask
";

    #[test]
    fn test_splits_git_diff_per_file() {
        let patches = split_patches(GIT_DIFF);
        assert_eq!(patches.len(), 2);

        assert_eq!(patches[0].path, Some(PathBuf::from("go.sum")));
        assert_eq!(
            patches[0].body,
            "@@ -1,2 +1,3 @@\n github.com/davecgh/go-spew v1.1.1 h1:vj9j=\n+example.org/mod v0.3.7 h1:UHqV=\n github.com/davecgh/go-spew v1.1.1/go.mod h1:J7Y8=\n"
        );

        assert_eq!(patches[1].path, Some(PathBuf::from("requirements.txt")));
        assert!(!patches[1].body.contains("+++"));
        assert!(patches[1].body.ends_with("+Django>=3.2,<4.0\n+flask\n"));
    }

    #[test]
    fn test_headerless_patch_is_single_unnamed_file() {
        let input = "@@ -1 +1 @@\n-flask==2.0\n+flask==2.3\n";
        let patches = split_patches(input);
        assert_eq!(
            patches,
            vec![FilePatch {
                path: None,
                body: input.to_string(),
            }]
        );
    }

    #[test]
    fn test_plain_unified_diff_headers() {
        let input = "--- requirements.txt\t2024-01-01 00:00:00\n+++ requirements.txt\t2024-01-02 00:00:00\n@@ -1 +1,2 @@\n requests\n+flask\n--- go.sum\n+++ go.sum\n@@ -0,0 +1 @@\n+example.org/mod v0.3.7 h1:x=\n";
        let patches = split_patches(input);
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].path, Some(PathBuf::from("requirements.txt")));
        assert_eq!(patches[0].body, "@@ -1 +1,2 @@\n requests\n+flask\n");
        assert_eq!(patches[1].path, Some(PathBuf::from("go.sum")));
    }

    #[test]
    fn test_header_lookalikes_inside_hunk_are_content() {
        let input = "--- a/notes.txt\n+++ b/notes.txt\n@@ -1,1 +1,1 @@\n--- old\n+++ new\n";
        let patches = split_patches(input);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].body, "@@ -1,1 +1,1 @@\n--- old\n+++ new\n");
    }

    #[test]
    fn test_deleted_file_keeps_old_path() {
        let input = "diff --git a/go.sum b/go.sum\ndeleted file mode 100644\n--- a/go.sum\n+++ /dev/null\n@@ -1 +0,0 @@\n-example.org/mod v0.3.7 h1:x=\n";
        let patches = split_patches(input);
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].path, Some(PathBuf::from("go.sum")));
    }

    #[test]
    fn test_hunk_header_counts() {
        let hunk = HunkRemaining::parse("@@ -3,7 +3,9 @@ fn main()").unwrap();
        assert_eq!((hunk.old, hunk.new), (7, 9));
        let hunk = HunkRemaining::parse("@@ -1 +1 @@").unwrap();
        assert_eq!((hunk.old, hunk.new), (1, 1));
        assert!(HunkRemaining::parse("@@ malformed").is_none());
    }
}
