//! Working-tree diffs against the base revision.
//!
//! All diffs compare BASE with the working tree (not HEAD), so uncommitted
//! patch applications are visible.

use std::collections::BTreeMap;

use patchwork_core::FileOperation;

use crate::error::GitError;
use crate::runner::Git;

/// One `--name-status` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedPath {
    pub operation: FileOperation,
    /// Source path of an `R` line.
    pub old_path: Option<String>,
}

impl ChangedPath {
    pub fn new(operation: FileOperation) -> Self {
        Self {
            operation,
            old_path: None,
        }
    }
}

impl Git<'_> {
    /// `git diff --name-status -M <base>`, keyed by destination path.
    pub fn diff_name_status(&self, base: &str) -> Result<BTreeMap<String, ChangedPath>, GitError> {
        let out = self.output(&["diff", "--name-status", "-M", base])?;
        Ok(parse_name_status(&String::from_utf8_lossy(&out)))
    }

    /// Full `git diff -M --full-index <base>` of the working tree.
    pub fn diff_full(&self, base: &str) -> Result<Vec<u8>, GitError> {
        self.output(&["diff", "-M", "--full-index", base])
    }

    /// Diff restricted to `files`, batched into one invocation.
    pub fn diff_files(&self, base: &str, files: &[String]) -> Result<Vec<u8>, GitError> {
        let mut args = vec!["diff", "-M", "--full-index", base, "--"];
        args.extend(files.iter().map(String::as_str));
        self.output(&args)
    }
}

/// Parse `--name-status` lines.
///
/// The last tab-separated field is the destination path, so renames map to
/// their new name and keep the source in `old_path`. Unrecognised status
/// letters count as modifications.
pub fn parse_name_status(out: &str) -> BTreeMap<String, ChangedPath> {
    let mut result = BTreeMap::new();
    for line in out.lines() {
        let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').map(str::trim).collect();
        let Some((path, rest)) = fields.split_last() else {
            continue;
        };
        let Some(status) = rest.first() else {
            continue;
        };
        if path.is_empty() {
            continue;
        }

        let change = match *status {
            "M" => ChangedPath::new(FileOperation::Modified),
            "A" => ChangedPath::new(FileOperation::Added),
            "D" => ChangedPath::new(FileOperation::Deleted),
            s if s.starts_with('R') => ChangedPath {
                operation: FileOperation::Renamed,
                old_path: rest.get(1).filter(|p| !p.is_empty()).map(|p| p.to_string()),
            },
            _ => ChangedPath::new(FileOperation::Modified),
        };
        result.insert(path.to_string(), change);
    }
    result
}
