//! On-disk patch store.
//!
//! One artifact per tracked path `p`, relative to the store root:
//!
//! | Operation      | Artifact(s)                 | Content                                 |
//! |----------------|-----------------------------|-----------------------------------------|
//! | Modified/Added | `p`                         | raw diff bytes                          |
//! | Deleted        | `p.deleted`                 | `deleted: <p>`                          |
//! | Binary         | `p.binary`                  | `binary: <p>`                           |
//! | Renamed        | `p` and `p.rename`          | diff at `p`, `rename_from`/`similarity` |
//!
//! The suffixes are only ever interpreted here. Everything outside this
//! module works with [`FilePatch`] values.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use patchwork_core::{FileOperation, FilePatch, PatchSet};

use crate::error::{io_err, SyncError};
use crate::pool;

pub const DELETED_SUFFIX: &str = ".deleted";
pub const BINARY_SUFFIX: &str = ".binary";
pub const RENAME_SUFFIX: &str = ".rename";

const RESERVED_SUFFIXES: [&str; 3] = [DELETED_SUFFIX, BINARY_SUFFIX, RENAME_SUFFIX];

// ---------------------------------------------------------------------------
// Artifact naming
// ---------------------------------------------------------------------------

/// What a single store file encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArtifactKind {
    Diff,
    Deleted,
    Binary,
    Rename,
}

impl ArtifactKind {
    const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Diff,
        ArtifactKind::Deleted,
        ArtifactKind::Binary,
        ArtifactKind::Rename,
    ];

    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Diff => "",
            ArtifactKind::Deleted => DELETED_SUFFIX,
            ArtifactKind::Binary => BINARY_SUFFIX,
            ArtifactKind::Rename => RENAME_SUFFIX,
        }
    }
}

/// Split a store-relative file name into its canonical path and kind.
///
/// Only one suffix is stripped: `a.rename.deleted` is the deletion marker of
/// `a.rename`.
pub(crate) fn split_artifact(rel: &str) -> (&str, ArtifactKind) {
    for kind in [ArtifactKind::Deleted, ArtifactKind::Binary, ArtifactKind::Rename] {
        if let Some(canonical) = rel.strip_suffix(kind.suffix()) {
            if !canonical.is_empty() {
                return (canonical, kind);
            }
        }
    }
    (rel, ArtifactKind::Diff)
}

/// Store file holding the diff for `path`.
pub fn artifact_path(root: &Path, path: &str) -> PathBuf {
    artifact_path_for(root, path, ArtifactKind::Diff)
}

fn artifact_path_for(root: &Path, path: &str, kind: ArtifactKind) -> PathBuf {
    root.join(format!("{path}{}", kind.suffix()))
}

fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

fn walk_err(root: &Path, e: walkdir::Error) -> SyncError {
    let path = e
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop in patch store"));
    io_err(path, source)
}

/// Every regular file under `root` as `(absolute, store-relative)` pairs.
///
/// A missing root is an empty store.
pub(crate) fn list_artifacts(root: &Path) -> Result<Vec<(PathBuf, String)>, SyncError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_err(root, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_key(root, entry.path());
        files.push((entry.into_path(), rel));
    }
    Ok(files)
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// One store file, read by a worker.
struct Record {
    canonical: String,
    kind: ArtifactKind,
    bytes: Vec<u8>,
}

/// Everything found on disk for one canonical path.
#[derive(Default)]
struct Pieces {
    diff: Option<Vec<u8>>,
    deleted: bool,
    binary: bool,
    rename: Option<Vec<u8>>,
}

impl Pieces {
    fn add(&mut self, kind: ArtifactKind, bytes: Vec<u8>) {
        match kind {
            ArtifactKind::Diff => self.diff = Some(bytes),
            ArtifactKind::Deleted => self.deleted = true,
            ArtifactKind::Binary => self.binary = true,
            ArtifactKind::Rename => self.rename = Some(bytes),
        }
    }

    fn into_patch(self, path: String) -> FilePatch {
        // Markers win over a diff left behind at the same path.
        if self.deleted {
            return FilePatch::deleted(path);
        }
        if self.binary {
            return FilePatch::binary(path);
        }
        if let Some(marker) = self.rename {
            let (old_path, similarity) = parse_rename_marker(&marker);
            if self.diff.is_none() {
                tracing::warn!("{path}: rename marker without a diff");
            }
            return FilePatch {
                path,
                operation: FileOperation::Renamed,
                content: self.diff,
                old_path,
                similarity,
            };
        }
        let content = self.diff.unwrap_or_default();
        let operation = if contains(&content, b"new file mode") {
            FileOperation::Added
        } else {
            FileOperation::Modified
        };
        FilePatch::with_content(path, operation, content)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn parse_rename_marker(bytes: &[u8]) -> (Option<String>, Option<u8>) {
    let text = String::from_utf8_lossy(bytes);
    let mut old_path = None;
    let mut similarity = None;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("rename_from:") {
            old_path = Some(v.trim().to_string()).filter(|p| !p.is_empty());
        } else if let Some(v) = line.strip_prefix("similarity:") {
            similarity = v.trim().parse().ok();
        }
    }
    (old_path, similarity)
}

/// Read every artifact under `root` into a [`PatchSet`].
///
/// Files are read on the worker pool; the first failed read aborts the whole
/// scan.
pub fn read_patch_set(root: &Path) -> Result<PatchSet, SyncError> {
    let files = list_artifacts(root)?;
    let mut pieces: BTreeMap<String, Pieces> = BTreeMap::new();

    pool::run(
        files,
        |(abs, rel)| {
            let bytes = std::fs::read(&abs).map_err(|e| io_err(&abs, e))?;
            let (canonical, kind) = split_artifact(&rel);
            Ok::<_, SyncError>(Record {
                canonical: canonical.to_string(),
                kind,
                bytes,
            })
        },
        |record| {
            pieces
                .entry(record.canonical)
                .or_default()
                .add(record.kind, record.bytes)
        },
    )?;

    let set: PatchSet = pieces
        .into_iter()
        .map(|(path, p)| p.into_patch(path))
        .collect();
    tracing::debug!("read {} store entries from {}", set.len(), root.display());
    Ok(set)
}

/// Canonical paths present in the store, without reading any content.
pub fn read_patch_files(root: &Path) -> Result<BTreeSet<String>, SyncError> {
    Ok(list_artifacts(root)?
        .iter()
        .map(|(_, rel)| split_artifact(rel).0.to_string())
        .collect())
}

// ---------------------------------------------------------------------------
// Write
// ---------------------------------------------------------------------------

/// Files to create and sibling artifacts to clear for one entry.
struct WriteJob {
    path: String,
    writes: Vec<(PathBuf, Vec<u8>)>,
    clears: Vec<PathBuf>,
}

fn plan(root: &Path, patch: &FilePatch) -> WriteJob {
    let path = patch.path.as_str();
    let diff = || patch.content.clone().unwrap_or_default();
    let writes: Vec<(ArtifactKind, Vec<u8>)> = match patch.operation {
        FileOperation::Modified | FileOperation::Added => vec![(ArtifactKind::Diff, diff())],
        FileOperation::Deleted => {
            vec![(ArtifactKind::Deleted, format!("deleted: {path}\n").into_bytes())]
        }
        FileOperation::Binary => {
            vec![(ArtifactKind::Binary, format!("binary: {path}\n").into_bytes())]
        }
        FileOperation::Renamed => {
            let mut marker = format!(
                "rename_from: {}\n",
                patch.old_path.as_deref().unwrap_or_default()
            );
            if let Some(similarity) = patch.similarity {
                marker.push_str(&format!("similarity: {similarity}\n"));
            }
            vec![
                (ArtifactKind::Diff, diff()),
                (ArtifactKind::Rename, marker.into_bytes()),
            ]
        }
    };

    let clears = ArtifactKind::ALL
        .into_iter()
        .filter(|k| writes.iter().all(|(w, _)| w != k))
        .map(|k| artifact_path_for(root, path, k))
        .collect();
    WriteJob {
        path: path.to_string(),
        writes: writes
            .into_iter()
            .map(|(k, bytes)| (artifact_path_for(root, path, k), bytes))
            .collect(),
        clears,
    }
}

fn execute(job: WriteJob) -> Result<Vec<PathBuf>, SyncError> {
    for stale in &job.clears {
        match std::fs::remove_file(stale) {
            Ok(()) => tracing::debug!("{}: removed {}", job.path, stale.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(stale, e)),
        }
    }
    let mut written = Vec::with_capacity(job.writes.len());
    for (dest, bytes) in job.writes {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&dest, &bytes).map_err(|e| io_err(&dest, e))?;
        written.push(dest);
    }
    Ok(written)
}

/// Materialise `set` under `root`.
///
/// Writing an entry also removes artifacts of any other kind left at the same
/// path, so a file that changed type does not read back twice. Returns the
/// artifact paths written, sorted; in dry-run mode nothing is touched and the
/// paths that would have been written are returned.
pub fn write_patch_set(
    root: &Path,
    set: &PatchSet,
    dry_run: bool,
) -> Result<Vec<PathBuf>, SyncError> {
    let mut jobs = Vec::with_capacity(set.len());
    for (path, patch) in set.iter() {
        if RESERVED_SUFFIXES.iter().any(|s| path.ends_with(s)) {
            tracing::warn!(
                "{path}: name ends in a reserved store suffix and will read back as a marker"
            );
        }
        jobs.push(plan(root, patch));
    }

    let mut written = Vec::new();
    if dry_run {
        for job in jobs {
            for (dest, _) in job.writes {
                tracing::info!("[dry-run] would write: {}", dest.display());
                written.push(dest);
            }
        }
    } else {
        pool::run(jobs, execute, |paths| written.extend(paths))?;
        tracing::info!("wrote {} store artifacts under {}", written.len(), root.display());
    }
    written.sort();
    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
