//! `patchwork init`: register a checkout with a patches repo.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use patchwork_git::{short_rev, SystemGit};
use patchwork_sync::{init_checkout, InitOptions};

use super::Outcome;
use crate::report::Palette;

/// Arguments for `patchwork init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory holding BASE_COMMIT and the patch store.
    #[arg(long)]
    pub patches_repo: PathBuf,

    /// Human name for this checkout (default: directory name).
    #[arg(long)]
    pub name: Option<String>,

    /// Store directory inside the patches repo.
    #[arg(long)]
    pub patches_dir: Option<String>,

    /// Directory that must exist next to `.git` (repeatable; default: chrome, base).
    #[arg(long = "marker", value_name = "DIR")]
    pub markers: Vec<String>,

    /// Checkout root (default: current directory).
    pub path: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self, palette: &Palette) -> Result<Outcome> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let dir = match self.path {
            Some(p) if p.is_absolute() => p,
            Some(p) => cwd.join(p),
            None => cwd.clone(),
        };
        let patches_repo = if self.patches_repo.is_absolute() {
            self.patches_repo
        } else {
            cwd.join(self.patches_repo)
        };

        let mut opts = InitOptions::new(patches_repo);
        opts.name = self.name;
        opts.patches_dir = self.patches_dir;
        if !self.markers.is_empty() {
            opts.markers = self.markers;
        }

        let runner = SystemGit::new();
        let report = init_checkout(&dir, &runner, &opts)
            .with_context(|| format!("init failed for {}", dir.display()))?;
        let ctx = &report.context;

        println!("{}\n", palette.title("patchwork init"));
        println!("  {} {}", palette.label("Checkout:"), ctx.checkout_name);
        println!("  {} {}", palette.label("Directory:"), ctx.working_tree.display());
        println!("  {} {}", palette.label("Patches repo:"), ctx.patches_repo.display());
        println!("  {} {}", palette.label("Base commit:"), short_rev(&ctx.base_revision));
        if let Some(version) = &ctx.upstream_version {
            println!("  {} {version}", palette.label("Upstream:"));
        }
        println!("  {} {} files", palette.label("Patches:"), report.store_entries);
        println!();
        println!("{}", palette.success("Initialized .patchwork/config.yaml"));
        println!(
            "{}",
            palette.muted("Run 'patchwork pull' to apply patches, or 'patchwork push' to extract.")
        );
        Ok(Outcome::Done)
    }
}
