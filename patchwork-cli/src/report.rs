//! Terminal rendering of sync results.
//!
//! Every function takes an explicit [`Palette`]; nothing here reads or sets
//! global colour state.

use std::fmt::Write;

use colored::{ColoredString, Colorize};

use patchwork_core::{ConflictInfo, PullResult, PushResult};

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Styling for one invocation, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// Colour is on unless `--no-color` was passed or `NO_COLOR` is set.
    pub fn new(no_color_flag: bool) -> Self {
        Self {
            enabled: !no_color_flag && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    #[cfg(test)]
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.enabled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn title(&self, text: &str) -> String {
        self.paint(text, |t| t.bold())
    }

    pub fn label(&self, text: &str) -> String {
        self.paint(text, |t| t.cyan())
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, |t| t.green())
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, |t| t.yellow())
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, |t| t.red().bold())
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, |t| t.bright_black())
    }

    /// Coloured one-letter status marker (`M`, `A`, `D`, `~`, ...).
    pub fn marker(&self, letter: char) -> String {
        let text = letter.to_string();
        match letter {
            'A' | 'N' | '+' => self.success(&text),
            'M' | 'U' | 'R' => self.warning(&text),
            'D' | 'x' => self.paint(&text, |t| t.red()),
            _ => self.muted(&text),
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Pull or clone outcome. `title` names the command.
pub fn render_pull_result(p: &Palette, title: &str, r: &PullResult, dry_run: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", p.title(title));

    for f in &r.applied {
        let _ = writeln!(out, "  {} {f}", p.marker('+'));
    }
    for c in &r.conflicts {
        let _ = writeln!(out, "  {} {}", p.marker('x'), c.file);
    }
    for f in &r.deleted {
        let _ = writeln!(out, "  {} {f}", p.marker('D'));
    }
    if !r.skipped.is_empty() {
        let skipped = format!("{} files skipped (already up to date)", r.skipped.len());
        let _ = writeln!(out, "  {} {}", p.marker('~'), p.muted(&skipped));
    }
    out.push('\n');

    let verb = if dry_run { "Would apply" } else { "Applied" };
    let _ = writeln!(
        out,
        "{}{}",
        p.success(&format!("{verb} {} patches", r.applied.len())),
        p.muted(&format!(
            " ({} conflicts, {} skipped, {} deleted)",
            r.conflicts.len(),
            r.skipped.len(),
            r.deleted.len()
        ))
    );
    out
}

pub fn render_push_result(p: &Palette, r: &PushResult, dry_run: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", p.title("patchwork push"));

    for f in &r.added {
        let _ = writeln!(out, "  {} {f}", p.marker('A'));
    }
    for f in &r.modified {
        let _ = writeln!(out, "  {} {f}", p.marker('M'));
    }
    for f in &r.deleted {
        let _ = writeln!(out, "  {} {f}", p.marker('D'));
    }
    let stale_note = if dry_run { "stale, would be removed" } else { "stale, removed" };
    for f in &r.stale {
        let _ = writeln!(out, "  {} {}", p.marker('~'), p.muted(&format!("{f} ({stale_note})")));
    }
    out.push('\n');

    let verb = if dry_run { "Would push" } else { "Pushed" };
    let _ = writeln!(
        out,
        "{}{}",
        p.success(&format!("{verb} {} patches", r.total())),
        p.muted(&format!(
            " ({} modified, {} added, {} deleted)",
            r.modified.len(),
            r.added.len(),
            r.deleted.len()
        ))
    );
    if !r.stale.is_empty() {
        let _ = writeln!(out, "{}", p.muted(&format!("Cleaned {} stale patches", r.stale.len())));
    }
    out
}

/// Per-conflict details, or an empty string when there are none.
pub fn render_conflict_report(p: &Palette, conflicts: &[ConflictInfo]) -> String {
    if conflicts.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let _ = writeln!(out, "\n{}\n", p.error("=== CONFLICT REPORT ==="));
    for (i, c) in conflicts.iter().enumerate() {
        let _ = writeln!(out, "file: {}", c.file);
        let _ = writeln!(out, "reject_file: {}", c.reject_file);
        let _ = writeln!(out, "patch_file: {}", c.patch_file.display());
        let _ = writeln!(out, "hunks_failed: {}", c.hunk_summary());
        if i + 1 < conflicts.len() {
            out.push_str("---\n");
        }
    }
    let _ = writeln!(
        out,
        "\n{}",
        p.muted("Resolve the .rej files by hand, then run 'patchwork push'.")
    );
    out
}
