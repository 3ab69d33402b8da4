//! Activity-log rendering payload built from sync results.

use chrono::{DateTime, Local};
use serde::Serialize;

use patchwork_core::{ConflictInfo, PullResult, PushResult};

use crate::error::RenderError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flat payload shared by every activity template.
///
/// Fields a workflow does not produce stay empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityContext {
    pub timestamp: String,
    pub base: String,
    pub patches_repo_rev: String,

    // push
    pub modified: Vec<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub stale: Vec<String>,
    pub total: usize,

    // pull / clone
    pub applied: Vec<String>,
    pub conflicts: Vec<ConflictCtx>,
    pub skipped: usize,
}

/// One conflict line.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictCtx {
    pub file: String,
    pub reject_file: String,
    /// `failed/total`, `?` where unknown.
    pub hunks: String,
}

impl From<&ConflictInfo> for ConflictCtx {
    fn from(info: &ConflictInfo) -> Self {
        Self {
            file: info.file.clone(),
            reject_file: info.reject_file.clone(),
            hunks: info.hunk_summary(),
        }
    }
}

impl ActivityContext {
    pub fn push(base: &str, result: &PushResult, at: DateTime<Local>) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            base: base.to_string(),
            modified: result.modified.clone(),
            added: result.added.clone(),
            deleted: result.deleted.clone(),
            stale: result.stale.clone(),
            total: result.total(),
            ..Self::default()
        }
    }

    /// Used for both pull and clone entries.
    pub fn pull(
        base: &str,
        patches_repo_rev: &str,
        result: &PullResult,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            base: base.to_string(),
            patches_repo_rev: patches_repo_rev.to_string(),
            applied: result.applied.clone(),
            conflicts: result.conflicts.iter().map(ConflictCtx::from).collect(),
            deleted: result.deleted.clone(),
            skipped: result.skipped.len(),
            ..Self::default()
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn push_context_counts_exclude_stale() {
        let at = Local.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let result = PushResult {
            modified: vec!["a.cc".into()],
            added: vec!["b.cc".into()],
            deleted: vec![],
            stale: vec!["c.cc".into()],
        };
        let ctx = ActivityContext::push("abc", &result, at);
        assert_eq!(ctx.total, 2);
        assert_eq!(ctx.timestamp, "2025-03-01 09:30:00");
        ctx.to_tera_context().expect("context conversion");
    }

    #[test]
    fn conflict_hunks_render_unknown_as_question_marks() {
        let info = ConflictInfo {
            file: "x.cc".into(),
            reject_file: "x.cc.rej".into(),
            ..ConflictInfo::default()
        };
        assert_eq!(ConflictCtx::from(&info).hunks, "?/?");
    }
}
