//! # patchwork-sync
//!
//! Patch store and sync workflows.
//!
//! - [`store`]: suffix-encoded on-disk store, read and written on a worker pool
//! - [`clone()`], [`pull()`], [`push()`]: the three sync directions
//! - [`status()`], [`preview`]: read-only reports
//! - [`init`]: registering a checkout
//! - [`activity`]: `state.yaml` events and the activity log

pub mod activity;
pub mod clone;
pub mod error;
pub mod init;
pub mod preview;
pub mod pull;
pub mod push;
pub mod stale;
pub mod status;
pub mod store;

mod pool;
mod worktree;

pub use activity::{patches_repo_rev, record_event, ActivityLog, EventSlot};
pub use clone::{clone, CloneOptions};
pub use error::SyncError;
pub use init::{bootstrap, init_checkout, InitOptions, InitReport};
pub use preview::{patch_drift, preview_pull, preview_push, PullChange, PullChangeKind, PushChange};
pub use pull::{pull, PullOptions};
pub use push::{push, PushOptions};
pub use stale::remove_stale;
pub use status::{status, StatusReport};
pub use store::{read_patch_files, read_patch_set, write_patch_set};

use patchwork_core::Context;
use patchwork_git::{Git, GitRunner};

/// A [`Git`] handle on the context's working tree with its configured timeouts.
pub fn git_for<'a>(ctx: &'a Context, runner: &'a dyn GitRunner) -> Git<'a> {
    Git::new(runner, &ctx.working_tree).with_timeouts(ctx.git_timeout, ctx.apply_timeout)
}
