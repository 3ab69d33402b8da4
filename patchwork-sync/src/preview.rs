//! Read-only previews of what push or pull would do.

use serde::Serialize;
use similar::TextDiff;

use patchwork_core::{Context, FileOperation};
use patchwork_git::GitRunner;

use crate::error::SyncError;
use crate::pull::{snapshot, Snapshot};

/// One path push would write to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushChange {
    pub path: String,
    pub operation: FileOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullChangeKind {
    /// Local patch differs from the stored one.
    Update,
    /// Stored patch not yet applied.
    New,
    /// Store records a deletion.
    Delete,
}

impl PullChangeKind {
    pub fn letter(&self) -> char {
        match self {
            PullChangeKind::Update => 'U',
            PullChangeKind::New => 'N',
            PullChangeKind::Delete => 'D',
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PullChangeKind::Update => "update",
            PullChangeKind::New => "new",
            PullChangeKind::Delete => "delete",
        }
    }
}

/// One path pull would change in the working tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullChange {
    pub path: String,
    pub kind: PullChangeKind,
    /// Unified diff from the stored patch text to the local one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<String>,
}

/// Local changes push would record, filtered to `files` when non-empty.
pub fn preview_push(ctx: &Context, runner: &dyn GitRunner, files: &[String]) -> Result<Vec<PushChange>, SyncError> {
    let git = crate::git_for(ctx, runner);
    let mut changed = git.diff_name_status(&ctx.base_revision)?;
    if !files.is_empty() {
        changed.retain(|path, change| {
            files.contains(path)
                || change.old_path.as_ref().is_some_and(|old| files.contains(old))
        });
    }
    Ok(changed
        .into_iter()
        .map(|(path, change)| PushChange {
            path,
            operation: change.operation,
        })
        .collect())
}

/// Working-tree changes pull would make, with optional patch drift for updates.
pub fn preview_pull(
    ctx: &Context,
    runner: &dyn GitRunner,
    files: &[String],
    with_drift: bool,
) -> Result<Vec<PullChange>, SyncError> {
    let git = crate::git_for(ctx, runner);
    let Snapshot { store, local, delta } = snapshot(ctx, &git, files)?;

    let mut out = Vec::new();
    for path in delta.needs_update {
        let drift = if with_drift {
            let stored = store.get(&path).and_then(|p| p.content.as_deref());
            let current = local.get(&path).and_then(|p| p.content.as_deref());
            Some(patch_drift(&path, stored.unwrap_or_default(), current.unwrap_or_default()))
        } else {
            None
        };
        out.push(PullChange {
            path,
            kind: PullChangeKind::Update,
            drift,
        });
    }
    for path in delta.needs_apply {
        out.push(PullChange {
            path,
            kind: PullChangeKind::New,
            drift: None,
        });
    }
    for path in delta.deleted {
        out.push(PullChange {
            path,
            kind: PullChangeKind::Delete,
            drift: None,
        });
    }
    Ok(out)
}

/// Unified diff between the stored and local patch text for `path`.
pub fn patch_drift(path: &str, stored: &[u8], local: &[u8]) -> String {
    let stored = String::from_utf8_lossy(stored);
    let local = String::from_utf8_lossy(local);
    let diff = TextDiff::from_lines(stored.as_ref(), local.as_ref());
    diff.unified_diff()
        .context_radius(3)
        .header(&format!("store/{path}"), &format!("local/{path}"))
        .to_string()
}
