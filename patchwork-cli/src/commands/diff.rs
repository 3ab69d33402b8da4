//! `patchwork diff`: preview what push or pull would do.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use patchwork_git::SystemGit;
use patchwork_sync::{preview_pull, preview_push};

use super::{current_context, Outcome};
use crate::report::Palette;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Push,
    Pull,
}

/// Arguments for `patchwork diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[arg(long, value_enum, default_value_t = Direction::Push)]
    pub direction: Direction,

    /// With `--direction pull`, show how each local patch differs from the stored one.
    #[arg(long)]
    pub patch: bool,

    /// Only preview these paths.
    pub files: Vec<String>,
}

impl DiffArgs {
    pub fn run(self, palette: &Palette) -> Result<Outcome> {
        let ctx = current_context()?;
        let runner = SystemGit::new();

        match self.direction {
            Direction::Push => {
                let changes = preview_push(&ctx, &runner, &self.files).context("diff failed")?;
                if changes.is_empty() {
                    println!("{}", palette.muted("No local changes to push."));
                    return Ok(Outcome::Done);
                }
                println!("{}\n", palette.title("patchwork diff --direction push"));
                for c in &changes {
                    println!("  {} {}", palette.marker(c.operation.letter()), c.path);
                }
                println!();
                println!(
                    "{}",
                    palette.muted(&format!("{} files would be pushed", changes.len()))
                );
            }
            Direction::Pull => {
                let changes = preview_pull(&ctx, &runner, &self.files, self.patch)
                    .context("diff failed")?;
                if changes.is_empty() {
                    println!("{}", palette.muted("Already up to date."));
                    return Ok(Outcome::Done);
                }
                println!("{}\n", palette.title("patchwork diff --direction pull"));
                for c in &changes {
                    let kind = format!("({})", c.kind.label());
                    println!("  {} {} {}", palette.marker(c.kind.letter()), c.path, palette.muted(&kind));
                    if let Some(drift) = &c.drift {
                        for line in drift.lines() {
                            println!("      {line}");
                        }
                    }
                }
                println!();
                println!(
                    "{}",
                    palette.muted(&format!("{} files would be changed", changes.len()))
                );
            }
        }
        Ok(Outcome::Done)
    }
}
