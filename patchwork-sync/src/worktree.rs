//! Working-tree steps shared by clone and pull.

use std::path::Path;

use patchwork_core::{FileOperation, FilePatch, PullResult};
use patchwork_git::{apply, ApplyOutcome, Git};

use crate::error::{io_err, SyncError};
use crate::store;

/// Delete `path` if it exists. Returns whether anything was removed.
pub(crate) fn remove_if_present(path: &Path) -> Result<bool, SyncError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Put `paths` back to their base-revision state.
///
/// Paths known to the base are restored in one batched checkout; the rest are
/// deleted and dropped from the index so a later apply can recreate them.
pub(crate) fn reset_to_base(git: &Git<'_>, base: &str, paths: &[String]) -> Result<(), SyncError> {
    let mut restore = Vec::new();
    let mut fresh = Vec::new();
    for path in paths {
        if git.file_exists_in_commit(base, path)? {
            restore.push(path.clone());
        } else {
            if remove_if_present(&git.dir().join(path))? {
                tracing::debug!("{path}: removed (not in base)");
            }
            fresh.push(path.clone());
        }
    }
    if !restore.is_empty() {
        git.checkout_files(base, &restore)?;
        tracing::debug!("reset {} files to base", restore.len());
    }
    git.untrack(&fresh)?;
    Ok(())
}

/// Apply one store entry to the working tree, recording the outcome.
pub(crate) fn apply_entry(
    git: &Git<'_>,
    base: &str,
    store_root: &Path,
    patch: &FilePatch,
    result: &mut PullResult,
) -> Result<(), SyncError> {
    let path = patch.path.as_str();
    let target = git.dir().join(path);

    if patch.operation == FileOperation::Deleted {
        if remove_if_present(&target)? {
            result.deleted.push(path.to_string());
        }
        return Ok(());
    }
    let Some(content) = patch.content.as_deref() else {
        tracing::debug!("{path}: no diff payload ({}), skipped", patch.operation);
        return Ok(());
    };

    // Diffs against base do not see untracked leftovers, which would block
    // the apply.
    let fresh = !git.file_exists_in_commit(base, path)?;
    if fresh {
        remove_if_present(&target)?;
    }
    if let Some(old) = patch.old_path.as_deref() {
        if !git.dir().join(old).exists() && git.file_exists_in_commit(base, old)? {
            git.checkout_files(base, &[old.to_string()])?;
        }
    }

    let patch_file = store::artifact_path(store_root, path);
    let outcome = apply(git, content, path, &patch_file).map_err(|source| SyncError::Apply {
        file: path.to_string(),
        source,
    })?;
    // Files created by the apply stay out of `git diff <base>` until the
    // index knows about them.
    if fresh && (matches!(outcome, ApplyOutcome::Clean(_)) || target.exists()) {
        git.intent_to_add(&[path.to_string()])?;
    }
    match outcome {
        ApplyOutcome::Clean(tier) => {
            tracing::info!("{path}: applied ({tier})");
            result.applied.push(path.to_string());
        }
        ApplyOutcome::Conflict(info) => result.conflicts.push(info),
    }
    Ok(())
}
