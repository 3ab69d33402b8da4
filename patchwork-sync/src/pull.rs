//! Incremental store → working-tree sync.

use patchwork_core::{compare, parse_unified_diff, Context, Delta, PatchSet, PullResult};
use patchwork_git::{Git, GitRunner};

use crate::error::SyncError;
use crate::store;
use crate::worktree::{apply_entry, remove_if_present, reset_to_base};

#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Report what would change without touching the working tree.
    pub dry_run: bool,
    /// Restrict the pull to these tracked paths. Empty means all.
    pub files: Vec<String>,
}

/// Store and local patch sets plus their classification.
pub(crate) struct Snapshot {
    pub store: PatchSet,
    pub local: PatchSet,
    pub delta: Delta,
}

/// Read the store, diff the working tree against base and compare the two.
pub(crate) fn snapshot(ctx: &Context, git: &Git<'_>, files: &[String]) -> Result<Snapshot, SyncError> {
    let store = store::read_patch_set(&ctx.store_root)?;
    let raw = git.diff_full(&ctx.base_revision)?;
    let mut local = parse_unified_diff(&raw)?;
    local.base = Some(ctx.base_revision.clone());

    let mut delta = compare(&local, &store);
    if !files.is_empty() {
        delta = delta.retain_files(files);
    }
    Ok(Snapshot { store, local, delta })
}

/// Bring the working tree in line with the store.
///
/// Locally diverged paths are reset to base before their stored patch is
/// re-applied. Paths already matching the store are reported as skipped.
pub fn pull(ctx: &Context, runner: &dyn GitRunner, opts: &PullOptions) -> Result<PullResult, SyncError> {
    let git = crate::git_for(ctx, runner);
    let Snapshot { store, delta, .. } = snapshot(ctx, &git, &opts.files)?;
    tracing::debug!(
        "pull: {} to update, {} new, {} up to date, {} deleted",
        delta.needs_update.len(),
        delta.needs_apply.len(),
        delta.up_to_date.len(),
        delta.deleted.len()
    );

    if opts.dry_run {
        return Ok(PullResult {
            applied: delta.pending(),
            skipped: delta.up_to_date,
            conflicts: Vec::new(),
            deleted: delta.deleted,
        });
    }

    reset_to_base(&git, &ctx.base_revision, &delta.needs_update)?;

    let mut result = PullResult {
        skipped: delta.up_to_date.clone(),
        ..PullResult::default()
    };
    for path in delta.pending() {
        let Some(patch) = store.get(&path) else {
            continue;
        };
        apply_entry(&git, &ctx.base_revision, &ctx.store_root, patch, &mut result)?;
    }
    for path in &delta.deleted {
        if remove_if_present(&ctx.working_tree.join(path))? {
            tracing::info!("{path}: deleted");
            result.deleted.push(path.clone());
        }
    }
    Ok(result)
}
