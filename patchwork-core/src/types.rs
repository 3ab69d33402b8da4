//! Domain types for patch synchronisation.
//!
//! Tracked paths are git-style strings (forward slashes, relative to the
//! working-tree root). Filesystem locations on the host use `PathBuf`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FileOperation
// ---------------------------------------------------------------------------

/// How a tracked path differs from the base revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileOperation {
    #[default]
    Modified,
    Added,
    Deleted,
    Renamed,
    Binary,
}

impl FileOperation {
    /// Single-letter status code, as printed in reports and the activity log.
    pub fn letter(&self) -> char {
        match self {
            FileOperation::Modified => 'M',
            FileOperation::Added => 'A',
            FileOperation::Deleted => 'D',
            FileOperation::Renamed => 'R',
            FileOperation::Binary => 'B',
        }
    }

    /// `true` for operations whose store artifact carries no diff payload.
    pub fn is_marker_only(&self) -> bool {
        matches!(self, FileOperation::Deleted | FileOperation::Binary)
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// ---------------------------------------------------------------------------
// FilePatch / PatchSet
// ---------------------------------------------------------------------------

/// One tracked path and the change recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilePatch {
    /// Destination path relative to the working-tree root.
    pub path: String,
    pub operation: FileOperation,
    /// Raw diff bytes. `None` for Deleted/Binary store entries.
    pub content: Option<Vec<u8>>,
    /// Source path, only for renames.
    pub old_path: Option<String>,
    /// Rename similarity (0-100), advisory only.
    pub similarity: Option<u8>,
}

impl FilePatch {
    /// A patch carrying diff bytes.
    pub fn with_content(
        path: impl Into<String>,
        operation: FileOperation,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            path: path.into(),
            operation,
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A deletion marker with no payload.
    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: FileOperation::Deleted,
            ..Self::default()
        }
    }

    /// A binary marker with no payload.
    pub fn binary(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operation: FileOperation::Binary,
            ..Self::default()
        }
    }

    /// A rename from `old_path` carrying the rename diff.
    pub fn renamed(
        path: impl Into<String>,
        old_path: impl Into<String>,
        similarity: u8,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            path: path.into(),
            operation: FileOperation::Renamed,
            content: Some(content.into()),
            old_path: Some(old_path.into()),
            similarity: Some(similarity),
        }
    }
}

/// Mapping of tracked path to its patch, plus the advisory base revision.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchSet {
    pub base: Option<String>,
    pub patches: BTreeMap<String, FilePatch>,
}

impl PatchSet {
    pub fn new(base: Option<String>) -> Self {
        Self {
            base,
            patches: BTreeMap::new(),
        }
    }

    /// Insert keyed by the patch's own path, replacing any previous entry.
    pub fn insert(&mut self, patch: FilePatch) -> Option<FilePatch> {
        self.patches.insert(patch.path.clone(), patch)
    }

    pub fn get(&self, path: &str) -> Option<&FilePatch> {
        self.patches.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.patches.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilePatch)> {
        self.patches.iter()
    }
}

impl FromIterator<FilePatch> for PatchSet {
    fn from_iter<I: IntoIterator<Item = FilePatch>>(iter: I) -> Self {
        let mut set = PatchSet::default();
        for patch in iter {
            set.insert(patch);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Delta
// ---------------------------------------------------------------------------

/// Five-way classification of local changes against the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Delta {
    /// In both, normalised content differs.
    pub needs_update: Vec<String>,
    /// In the store only.
    pub needs_apply: Vec<String>,
    /// In both, normalised content equal.
    pub up_to_date: Vec<String>,
    /// Local only.
    pub orphaned: Vec<String>,
    /// Store deletion markers.
    pub deleted: Vec<String>,
}

impl Delta {
    /// Restrict every category to `files`, keeping category membership.
    pub fn retain_files(&self, files: &[String]) -> Delta {
        let wanted: BTreeSet<&str> = files.iter().map(String::as_str).collect();
        let keep = |paths: &[String]| -> Vec<String> {
            paths
                .iter()
                .filter(|p| wanted.contains(p.as_str()))
                .cloned()
                .collect()
        };
        Delta {
            needs_update: keep(&self.needs_update),
            needs_apply: keep(&self.needs_apply),
            up_to_date: keep(&self.up_to_date),
            orphaned: keep(&self.orphaned),
            deleted: keep(&self.deleted),
        }
    }

    /// Paths a pull would apply: NeedsUpdate followed by NeedsApply.
    pub fn pending(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.needs_update.len() + self.needs_apply.len());
        out.extend(self.needs_update.iter().cloned());
        out.extend(self.needs_apply.iter().cloned());
        out
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Structured record of a patch that only partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ConflictInfo {
    pub file: String,
    /// Reject sidecar, relative to the working-tree root.
    pub reject_file: String,
    /// Store artifact the patch came from.
    pub patch_file: PathBuf,
    /// `None` when the tool's diagnostics could not be interpreted.
    pub hunks_total: Option<usize>,
    pub hunks_failed: Option<usize>,
    pub error: String,
}

impl ConflictInfo {
    /// `failed/total`, with `?` for unknown counts.
    pub fn hunk_summary(&self) -> String {
        let show = |n: Option<usize>| n.map_or_else(|| "?".to_string(), |n| n.to_string());
        format!("{}/{}", show(self.hunks_failed), show(self.hunks_total))
    }
}

/// Outcome of a clone or pull.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PullResult {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub conflicts: Vec<ConflictInfo>,
    pub deleted: Vec<String>,
}

impl PullResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Nothing applied, deleted, or conflicted.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.conflicts.is_empty() && self.deleted.is_empty()
    }
}

/// Outcome of a push.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PushResult {
    pub modified: Vec<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    /// Canonical paths whose store artifacts were removed.
    pub stale: Vec<String>,
}

impl PushResult {
    pub fn total(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len()
    }

    pub fn is_noop(&self) -> bool {
        self.total() == 0 && self.stale.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_letters() {
        assert_eq!(FileOperation::Modified.to_string(), "M");
        assert_eq!(FileOperation::Binary.to_string(), "B");
        assert!(FileOperation::Deleted.is_marker_only());
        assert!(!FileOperation::Renamed.is_marker_only());
    }

    #[test]
    fn patch_set_keys_by_patch_path() {
        let mut set = PatchSet::new(Some("abc".into()));
        set.insert(FilePatch::deleted("a/b.cc"));
        let replaced = set.insert(FilePatch::binary("a/b.cc"));
        assert!(replaced.is_some());
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a/b.cc").unwrap().operation, FileOperation::Binary);
    }

    #[test]
    fn delta_filter_keeps_categories() {
        let delta = Delta {
            needs_update: vec!["a".into(), "b".into()],
            needs_apply: vec!["c".into()],
            up_to_date: vec!["d".into()],
            orphaned: vec!["e".into()],
            deleted: vec!["f".into()],
        };
        let filtered = delta.retain_files(&["b".into(), "c".into(), "f".into()]);
        assert_eq!(filtered.needs_update, vec!["b".to_string()]);
        assert_eq!(filtered.needs_apply, vec!["c".to_string()]);
        assert!(filtered.up_to_date.is_empty());
        assert!(filtered.orphaned.is_empty());
        assert_eq!(filtered.deleted, vec!["f".to_string()]);
        assert_eq!(filtered.pending(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn hunk_summary_marks_unknown_counts() {
        let known = ConflictInfo {
            hunks_total: Some(3),
            hunks_failed: Some(1),
            ..ConflictInfo::default()
        };
        assert_eq!(known.hunk_summary(), "1/3");
        assert_eq!(ConflictInfo::default().hunk_summary(), "?/?");
    }

    #[test]
    fn push_total_excludes_stale() {
        let result = PushResult {
            modified: vec!["a".into()],
            added: vec!["b".into()],
            deleted: vec![],
            stale: vec!["c".into()],
        };
        assert_eq!(result.total(), 2);
        assert!(!result.is_noop());
    }
}
