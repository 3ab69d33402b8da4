//! `patchwork pull`: apply store changes to the checkout.

use anyhow::{Context, Result};
use clap::Args;

use patchwork_git::SystemGit;
use patchwork_renderer::ActivityKind;
use patchwork_sync::{pull, PullOptions};

use super::{current_context, record_pull, Outcome};
use crate::report::{render_conflict_report, render_pull_result, Palette};

/// Arguments for `patchwork pull`.
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Show what would change without touching the checkout.
    #[arg(long)]
    pub dry_run: bool,

    /// Only pull these paths.
    pub files: Vec<String>,
}

impl PullArgs {
    pub fn run(self, palette: &Palette) -> Result<Outcome> {
        let ctx = current_context()?;
        let runner = SystemGit::new();
        if self.dry_run {
            println!("{}\n", palette.muted("dry run: no files will be modified"));
        }

        let opts = PullOptions {
            dry_run: self.dry_run,
            files: self.files,
        };
        let result = pull(&ctx, &runner, &opts).context("pull failed")?;

        if result.is_noop() && !self.dry_run {
            println!("{}", palette.muted("Already up to date."));
        } else {
            print!("{}", render_pull_result(palette, "patchwork pull", &result, self.dry_run));
            print!("{}", render_conflict_report(palette, &result.conflicts));
        }
        if !self.dry_run {
            record_pull(&ctx, &runner, ActivityKind::Pull, &result);
        }
        Ok(Outcome::of(&result))
    }
}
