//! Working-tree → store extraction.

use patchwork_core::{parse_unified_diff, Context, FileOperation, FilePatch, PushResult};
use patchwork_git::GitRunner;

use crate::error::SyncError;
use crate::stale::remove_stale;
use crate::store;

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub dry_run: bool,
    /// Push only these paths. Empty means the whole tree, with stale cleanup.
    pub files: Vec<String>,
}

/// Record the working tree's changes against base into the store.
pub fn push(ctx: &Context, runner: &dyn GitRunner, opts: &PushOptions) -> Result<PushResult, SyncError> {
    let git = crate::git_for(ctx, runner);
    let base = ctx.base_revision.as_str();

    let mut changed = git.diff_name_status(base)?;
    if !opts.files.is_empty() {
        changed.retain(|path, change| {
            opts.files.contains(path)
                || change.old_path.as_ref().is_some_and(|old| opts.files.contains(old))
        });
    }
    // An empty diff never reaches stale cleanup, which would empty the store.
    if changed.is_empty() {
        tracing::info!("push: no local changes against base");
        return Ok(PushResult::default());
    }

    // Rename detection inside `git diff` needs both sides in the pathspec.
    let mut paths: Vec<String> = changed.keys().cloned().collect();
    paths.extend(changed.values().filter_map(|c| c.old_path.clone()));
    paths.sort();
    paths.dedup();
    let raw = git.diff_files(base, &paths)?;
    let mut set = parse_unified_diff(&raw)?;
    set.base = Some(ctx.base_revision.clone());

    for (path, change) in &changed {
        if change.operation == FileOperation::Deleted && !set.contains(path) {
            set.insert(FilePatch::deleted(path.as_str()));
        }
    }

    let existing = store::read_patch_files(&ctx.store_root)?;
    let mut result = PushResult::default();
    for (path, patch) in set.iter() {
        match patch.operation {
            FileOperation::Deleted => result.deleted.push(path.clone()),
            _ if existing.contains(path) => result.modified.push(path.clone()),
            _ => result.added.push(path.clone()),
        }
    }

    store::write_patch_set(&ctx.store_root, &set, opts.dry_run)?;

    if opts.files.is_empty() {
        result.stale = remove_stale(&ctx.store_root, &set, opts.dry_run)?;
    }
    tracing::info!(
        "push: {} modified, {} added, {} deleted, {} stale",
        result.modified.len(),
        result.added.len(),
        result.deleted.len(),
        result.stale.len()
    );
    Ok(result)
}
