//! Stale-artifact cleanup after a full push.

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use patchwork_core::PatchSet;

use crate::error::{io_err, SyncError};
use crate::store::{list_artifacts, split_artifact};

/// Remove every store artifact whose canonical path is not in `current`.
///
/// Returns the canonical paths removed (sorted, one per path even when it had
/// several artifacts), then prunes directories left empty, deepest first.
/// With `dry_run` nothing is deleted and the paths that would go are returned.
pub fn remove_stale(root: &Path, current: &PatchSet, dry_run: bool) -> Result<Vec<String>, SyncError> {
    let mut stale = BTreeSet::new();
    for (abs, rel) in list_artifacts(root)? {
        let (canonical, _) = split_artifact(&rel);
        if current.contains(canonical) {
            continue;
        }
        if dry_run {
            tracing::info!("[dry-run] would remove stale: {rel}");
        } else {
            std::fs::remove_file(&abs).map_err(|e| io_err(&abs, e))?;
            tracing::info!("removed stale: {rel}");
        }
        stale.insert(canonical.to_string());
    }

    if !dry_run && !stale.is_empty() {
        prune_empty_dirs(root);
    }
    Ok(stale.into_iter().collect())
}

/// Best effort; failures are logged and skipped.
fn prune_empty_dirs(root: &Path) {
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("walking {}: {e}", root.display());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let empty = match std::fs::read_dir(entry.path()) {
            Ok(mut it) => it.next().is_none(),
            Err(e) => {
                tracing::warn!("reading {}: {e}", entry.path().display());
                continue;
            }
        };
        if empty {
            if let Err(e) = std::fs::remove_dir(entry.path()) {
                tracing::warn!("removing empty dir {}: {e}", entry.path().display());
            }
        }
    }
}
