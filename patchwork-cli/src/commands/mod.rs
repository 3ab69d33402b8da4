pub mod clone;
pub mod diff;
pub mod init;
pub mod pull;
pub mod push;
pub mod status;

use anyhow::{Context as _, Result};

use patchwork_core::config::SyncEvent;
use patchwork_core::{load_context, Context, PullResult, PushResult};
use patchwork_git::GitRunner;
use patchwork_renderer::ActivityKind;
use patchwork_sync::{patches_repo_rev, record_event, ActivityLog, EventSlot};

/// How a command finished, mapped to the process exit code in `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Completed, but some patches left `.rej` files.
    Conflicts,
}

impl Outcome {
    pub fn of(result: &PullResult) -> Self {
        if result.has_conflicts() {
            Outcome::Conflicts
        } else {
            Outcome::Done
        }
    }
}

pub(crate) fn current_context() -> Result<Context> {
    load_context().context("run `patchwork init --patches-repo <dir>` in the checkout first")
}

/// Record a completed clone or pull. Failures only warn.
pub(crate) fn record_pull(ctx: &Context, runner: &dyn GitRunner, kind: ActivityKind, result: &PullResult) {
    let rev = patches_repo_rev(ctx, runner);
    let count = result.applied.len() + result.deleted.len();
    if let Err(e) = record_event(ctx, EventSlot::Pull, SyncEvent::now(&rev, count)) {
        tracing::warn!("could not update state: {e}");
    }
    if let Err(e) = ActivityLog::open(ctx).and_then(|log| log.record_pull(kind, &rev, result)) {
        tracing::warn!("could not write activity log: {e}");
    }
}

/// Record a completed push. Failures only warn.
pub(crate) fn record_push(ctx: &Context, runner: &dyn GitRunner, result: &PushResult) {
    let rev = patches_repo_rev(ctx, runner);
    if let Err(e) = record_event(ctx, EventSlot::Push, SyncEvent::now(&rev, result.total())) {
        tracing::warn!("could not update state: {e}");
    }
    if let Err(e) = ActivityLog::open(ctx).and_then(|log| log.record_push(result)) {
        tracing::warn!("could not write activity log: {e}");
    }
}
