//! `patchwork status`: how far the checkout and the store have drifted.

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use patchwork_core::config::SyncEvent;
use patchwork_git::{short_rev, SystemGit};
use patchwork_sync::{status, StatusReport};

use super::{current_context, Outcome};
use crate::report::Palette;

/// Arguments for `patchwork status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// List the files in each category.
    #[arg(long)]
    pub files: bool,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "files")]
    files: usize,
    #[tabled(rename = "meaning")]
    meaning: &'static str,
}

impl StatusArgs {
    pub fn run(self, palette: &Palette) -> Result<Outcome> {
        let ctx = current_context()?;
        let runner = SystemGit::new();
        let report = status(&ctx, &runner, self.files).context("status failed")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(Outcome::Done);
        }
        print_report(palette, &report);
        Ok(Outcome::Done)
    }
}

fn event_line(event: Option<&SyncEvent>) -> String {
    match event {
        Some(e) => format!(
            "{} ({} files, patches {})",
            e.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            e.file_count,
            short_rev(&e.patches_repo_rev)
        ),
        None => "never".to_string(),
    }
}

fn print_report(p: &Palette, r: &StatusReport) {
    println!("{}\n", p.title("patchwork status"));
    println!("  {} {}", p.label("Checkout:"), r.checkout);
    println!("  {} {}", p.label("Base commit:"), short_rev(&r.base_revision));
    if let Some(version) = &r.upstream_version {
        println!("  {} {version}", p.label("Upstream:"));
    }
    println!("  {} {}", p.label("Patches repo:"), r.patches_repo.display());
    println!("  {} {}", p.label("Last pull:"), event_line(r.last_pull.as_ref()));
    println!("  {} {}", p.label("Last push:"), event_line(r.last_push.as_ref()));
    println!();

    let rows = vec![
        CountRow {
            state: p.warning("ahead"),
            files: r.ahead,
            meaning: "local changes not in patches repo",
        },
        CountRow {
            state: p.warning("behind"),
            files: r.behind,
            meaning: "patches in repo not applied locally",
        },
        CountRow {
            state: p.success("synced"),
            files: r.synced,
            meaning: "local matches patches repo",
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if let Some(files) = &r.files {
        let sections = [
            ("Ahead files:", 'A', &files.orphaned),
            ("Behind files (update):", 'U', &files.needs_update),
            ("Behind files (new):", 'N', &files.needs_apply),
            ("Deleted in patches repo:", 'D', &files.deleted),
        ];
        for (heading, letter, paths) in sections {
            if paths.is_empty() {
                continue;
            }
            println!("\n  {heading}");
            for f in paths {
                println!("    {} {f}", p.marker(letter));
            }
        }
    }

    println!();
    if r.in_sync() {
        println!("{}", p.success("Checkout is in sync with the patches repo."));
    } else if r.behind > 0 {
        println!("{}", p.muted("Run 'patchwork pull' to apply pending patches."));
    } else {
        println!("{}", p.muted("Run 'patchwork push' to record local changes."));
    }
}
