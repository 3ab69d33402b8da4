//! Post-run bookkeeping: `state.yaml` events and the activity log.

use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use patchwork_core::config::{read_state, write_state, SyncEvent};
use patchwork_core::{Context, PullResult, PushResult};
use patchwork_git::{Git, GitRunner};
use patchwork_renderer::{ActivityContext, ActivityKind, TemplateEngine};

use crate::error::{io_err, SyncError};

pub const ACTIVITY_LOG: &str = "activity.log";

/// Which `state.yaml` slot an event goes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSlot {
    Pull,
    Push,
}

/// Patches repo `HEAD`, or `"unknown"` when it is not a git repository.
pub fn patches_repo_rev(ctx: &Context, runner: &dyn GitRunner) -> String {
    let git = Git::new(runner, &ctx.patches_repo).with_timeouts(ctx.git_timeout, ctx.apply_timeout);
    match git.head_rev() {
        Ok(rev) if !rev.is_empty() => rev,
        Ok(_) => "unknown".to_string(),
        Err(e) => {
            tracing::debug!("patches repo revision: {e}");
            "unknown".to_string()
        }
    }
}

/// Store `event` as the last pull or push.
pub fn record_event(ctx: &Context, slot: EventSlot, event: SyncEvent) -> Result<(), SyncError> {
    let mut state = read_state(&ctx.state_dir)?;
    match slot {
        EventSlot::Pull => state.last_pull = Some(event),
        EventSlot::Push => state.last_push = Some(event),
    }
    write_state(&ctx.state_dir, &state)?;
    Ok(())
}

/// Appends rendered entries to `.patchwork/logs/activity.log`.
pub struct ActivityLog {
    path: PathBuf,
    base: String,
    engine: TemplateEngine,
}

impl ActivityLog {
    /// Templates in `.patchwork/templates/` override the embedded ones.
    pub fn open(ctx: &Context) -> Result<Self, SyncError> {
        Ok(Self {
            path: ctx.logs_dir().join(ACTIVITY_LOG),
            base: ctx.base_revision.clone(),
            engine: TemplateEngine::new(Some(&ctx.templates_dir()))?,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn record_push(&self, result: &PushResult) -> Result<(), SyncError> {
        let ctx = ActivityContext::push(&self.base, result, Local::now());
        self.append(&self.engine.render(ActivityKind::Push, &ctx)?)
    }

    /// `kind` is [`ActivityKind::Pull`] or [`ActivityKind::Clone`].
    pub fn record_pull(&self, kind: ActivityKind, rev: &str, result: &PullResult) -> Result<(), SyncError> {
        let ctx = ActivityContext::pull(&self.base, rev, result, Local::now());
        self.append(&self.engine.render(kind, &ctx)?)
    }

    fn append(&self, entry: &str) -> Result<(), SyncError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| io_err(&self.path, e))?;
        file.write_all(entry.as_bytes())
            .map_err(|e| io_err(&self.path, e))
    }
}
