//! Tera rendering engine: [`ActivityKind`] and [`TemplateEngine`].
//!
//! | Kind  | Template                     |
//! |-------|------------------------------|
//! | Push  | `activity/push.log.tera`     |
//! | Pull  | `activity/pull.log.tera`     |
//! | Clone | `activity/clone.log.tera`    |
//!
//! A `.tera` file with the same relative name under the user template
//! directory (`.patchwork/templates/`) replaces the embedded default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::ActivityContext;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates, baked in at compile time
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (
        "activity/push.log.tera",
        include_str!("templates/activity/push.log.tera"),
    ),
    (
        "activity/pull.log.tera",
        include_str!("templates/activity/pull.log.tera"),
    ),
    (
        "activity/clone.log.tera",
        include_str!("templates/activity/clone.log.tera"),
    ),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io {
        path: path.into(),
        source,
    }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((normalize_template_name(rel), contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (normalize_template_name(Path::new(name)), content.to_string()))
        .collect();
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ActivityKind
// ---------------------------------------------------------------------------

/// Which workflow an activity-log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Push,
    Pull,
    Clone,
}

impl ActivityKind {
    pub fn all() -> &'static [ActivityKind] {
        &[ActivityKind::Push, ActivityKind::Pull, ActivityKind::Clone]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            ActivityKind::Push => "activity/push.log.tera",
            ActivityKind::Pull => "activity/pull.log.tera",
            ActivityKind::Clone => "activity/clone.log.tera",
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Embedded activity templates plus optional user overrides.
///
/// Immutable once built; construct one per invocation and pass it by reference.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load embedded templates plus any overrides in `user_template_dir`.
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(TemplateEngine {
            tera: build_tera(user_template_dir)?,
        })
    }

    /// Render one log entry.
    pub fn render(&self, kind: ActivityKind, ctx: &ActivityContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(kind.template_name(), &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use patchwork_core::{ConflictInfo, PullResult, PushResult};
    use tempfile::TempDir;

    fn at() -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, 14, 5, 9).unwrap()
    }

    fn divider(ch: char) -> String {
        std::iter::repeat(ch).take(50).collect()
    }

    #[test]
    fn push_entry_matches_log_format() {
        let engine = TemplateEngine::new(None).unwrap();
        let result = PushResult {
            modified: vec!["chrome/a.cc".into()],
            added: vec!["chrome/new.h".into()],
            deleted: vec!["chrome/old.cc".into()],
            stale: vec!["chrome/gone.cc".into()],
        };
        let out = engine
            .render(ActivityKind::Push, &ActivityContext::push("base123", &result, at()))
            .unwrap();

        let expected = format!(
            "{}\nPUSH  2025-06-02 14:05:09\nBase: base123\n{}\n  M chrome/a.cc\n  A chrome/new.h\n  D chrome/old.cc\nStale removed:\n  chrome/gone.cc\nSummary: 3 pushed (1 modified, 1 added, 1 deleted), 1 stale removed\n\n",
            divider('='),
            divider('-')
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn pull_entry_lists_conflicts_and_skips() {
        let engine = TemplateEngine::new(None).unwrap();
        let result = PullResult {
            applied: vec!["a.cc".into()],
            skipped: vec!["b.cc".into(), "c.cc".into()],
            conflicts: vec![ConflictInfo {
                file: "d.cc".into(),
                reject_file: "d.cc.rej".into(),
                hunks_total: Some(4),
                hunks_failed: Some(2),
                ..ConflictInfo::default()
            }],
            deleted: vec![],
        };
        let out = engine
            .render(
                ActivityKind::Pull,
                &ActivityContext::pull("base123", "rev456", &result, at()),
            )
            .unwrap();

        assert!(out.starts_with(&divider('=')));
        assert!(out.contains("PULL  2025-06-02 14:05:09\n"));
        assert!(out.contains("Patches repo rev: rev456\n"));
        assert!(out.contains("  + a.cc\n"));
        assert!(out.contains("  x d.cc -> d.cc.rej (hunk 2/4 failed)\n"));
        assert!(out.contains("  ~ 2 files skipped (already up to date)\n"));
        assert!(out.ends_with("Summary: 1 applied, 1 conflicts, 2 skipped\n\n"));
    }

    #[test]
    fn every_kind_renders_with_empty_results() {
        let engine = TemplateEngine::new(None).unwrap();
        let ctx = ActivityContext::pull("b", "r", &PullResult::default(), at());
        for kind in ActivityKind::all() {
            let out = engine
                .render(*kind, &ctx)
                .unwrap_or_else(|e| panic!("render failed for {kind:?}: {e}"));
            assert!(out.contains("Summary:"), "{kind:?} entry lacks a summary");
        }
    }

    #[test]
    fn user_template_overrides_embedded_default() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("activity")).unwrap();
        std::fs::write(
            dir.path().join("activity/push.log.tera"),
            "pushed {{ total }} at {{ timestamp }}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let engine = TemplateEngine::new(Some(dir.path())).unwrap();
        let ctx = ActivityContext::push("b", &PushResult::default(), at());
        assert_eq!(
            engine.render(ActivityKind::Push, &ctx).unwrap(),
            "pushed 0 at 2025-06-02 14:05:09\n"
        );
        // Untouched kinds keep the embedded template.
        let pull = engine.render(ActivityKind::Pull, &ctx).unwrap();
        assert!(pull.contains("PULL  "));
    }

    #[test]
    fn broken_user_template_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("activity")).unwrap();
        std::fs::write(dir.path().join("activity/pull.log.tera"), "{% if %}").unwrap();
        assert!(matches!(
            TemplateEngine::new(Some(dir.path())),
            Err(RenderError::Tera(_))
        ));
    }
}
