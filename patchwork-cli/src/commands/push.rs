//! `patchwork push`: extract checkout changes into the store.

use anyhow::{Context, Result};
use clap::Args;

use patchwork_git::SystemGit;
use patchwork_sync::{push, PushOptions};

use super::{current_context, record_push, Outcome};
use crate::report::{render_push_result, Palette};

/// Arguments for `patchwork push`.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Show what would be written without touching the store.
    #[arg(long)]
    pub dry_run: bool,

    /// Only push these paths (skips stale cleanup).
    pub files: Vec<String>,
}

impl PushArgs {
    pub fn run(self, palette: &Palette) -> Result<Outcome> {
        let ctx = current_context()?;
        let runner = SystemGit::new();
        if self.dry_run {
            println!("{}\n", palette.muted("dry run: no files will be written"));
        }

        let opts = PushOptions {
            dry_run: self.dry_run,
            files: self.files,
        };
        let result = push(&ctx, &runner, &opts).context("push failed")?;

        if result.is_noop() {
            println!(
                "{}",
                palette.muted("Nothing to push: checkout matches patches repo.")
            );
            return Ok(Outcome::Done);
        }
        print!("{}", render_push_result(palette, &result, self.dry_run));
        if !self.dry_run {
            record_push(&ctx, &runner, &result);
        }
        Ok(Outcome::Done)
    }
}
