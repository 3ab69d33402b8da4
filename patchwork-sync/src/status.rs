//! Sync status of a checkout against its patches repo.

use std::path::PathBuf;

use serde::Serialize;

use patchwork_core::config::{read_state, SyncEvent};
use patchwork_core::{Context, Delta};
use patchwork_git::GitRunner;

use crate::error::SyncError;
use crate::pull::{snapshot, Snapshot};

/// Counts are from the checkout's point of view: `ahead` is local work the
/// store lacks, `behind` is store work the checkout lacks.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checkout: String,
    pub base_revision: String,
    pub upstream_version: Option<String>,
    pub patches_repo: PathBuf,
    pub ahead: usize,
    pub behind: usize,
    pub synced: usize,
    pub deleted: usize,
    pub last_pull: Option<SyncEvent>,
    pub last_push: Option<SyncEvent>,
    /// Per-category paths, only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Delta>,
}

impl StatusReport {
    pub fn in_sync(&self) -> bool {
        self.ahead == 0 && self.behind == 0
    }
}

pub fn status(ctx: &Context, runner: &dyn GitRunner, show_files: bool) -> Result<StatusReport, SyncError> {
    let git = crate::git_for(ctx, runner);
    let Snapshot { delta, .. } = snapshot(ctx, &git, &[])?;
    let state = read_state(&ctx.state_dir)?;

    Ok(StatusReport {
        checkout: ctx.checkout_name.clone(),
        base_revision: ctx.base_revision.clone(),
        upstream_version: ctx.upstream_version.clone(),
        patches_repo: ctx.patches_repo.clone(),
        ahead: delta.orphaned.len(),
        behind: delta.needs_apply.len() + delta.needs_update.len(),
        synced: delta.up_to_date.len(),
        deleted: delta.deleted.len(),
        last_pull: state.last_pull,
        last_push: state.last_push,
        files: show_files.then_some(delta),
    })
}
