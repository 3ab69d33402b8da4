//! Full, non-incremental store → working-tree apply.

use patchwork_core::{Context, FileOperation, PullResult};
use patchwork_git::{short_rev, Git, GitRunner};

use crate::error::SyncError;
use crate::store;
use crate::worktree::{apply_entry, reset_to_base};

#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Refuse to run unless HEAD is the recorded base revision.
    pub verify_base: bool,
    /// Reset every locally changed file to base first.
    pub clean: bool,
    pub dry_run: bool,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            verify_base: true,
            clean: false,
            dry_run: false,
        }
    }
}

/// Apply every store entry to the working tree, without consulting local diffs.
pub fn clone(ctx: &Context, runner: &dyn GitRunner, opts: &CloneOptions) -> Result<PullResult, SyncError> {
    let git = crate::git_for(ctx, runner);

    if opts.verify_base {
        verify_base(&git, &ctx.base_revision)?;
    }
    if opts.clean && !opts.dry_run {
        clean(&git, &ctx.base_revision)?;
    }

    let set = store::read_patch_set(&ctx.store_root)?;
    let mut result = PullResult::default();

    if opts.dry_run {
        for (path, patch) in set.iter() {
            match patch.operation {
                FileOperation::Deleted => result.deleted.push(path.clone()),
                _ => result.applied.push(path.clone()),
            }
        }
        return Ok(result);
    }

    for (_, patch) in set.iter() {
        apply_entry(&git, &ctx.base_revision, &ctx.store_root, patch, &mut result)?;
    }
    tracing::info!(
        "clone: {} applied, {} conflicts, {} deleted",
        result.applied.len(),
        result.conflicts.len(),
        result.deleted.len()
    );
    Ok(result)
}

fn verify_base(git: &Git<'_>, base: &str) -> Result<(), SyncError> {
    if !git.commit_exists(base)? {
        return Err(SyncError::UnknownBaseCommit {
            commit: base.to_string(),
        });
    }
    let head = git.head_rev()?;
    let base = git.rev_parse(base)?;
    if head != base {
        return Err(SyncError::BaseMismatch {
            head: short_rev(&head).to_string(),
            base: short_rev(&base).to_string(),
        });
    }
    Ok(())
}

fn clean(git: &Git<'_>, base: &str) -> Result<(), SyncError> {
    let mut changed = Vec::new();
    for (path, change) in git.diff_name_status(base)? {
        changed.extend(change.old_path);
        changed.push(path);
    }
    if changed.is_empty() {
        return Ok(());
    }
    tracing::info!("clean: resetting {} changed files to base", changed.len());
    reset_to_base(git, base, &changed)
}
