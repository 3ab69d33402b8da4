//! `patchwork clone`: apply every stored patch to a checkout.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::{ArgAction, Args};

use patchwork_core::{load_context_at, ConfigError, Context};
use patchwork_git::{GitRunner, SystemGit};
use patchwork_renderer::ActivityKind;
use patchwork_sync::init::config_for;
use patchwork_sync::{bootstrap, clone, CloneOptions, InitOptions};

use super::{record_pull, Outcome};
use crate::report::{render_conflict_report, render_pull_result, Palette};

/// Arguments for `patchwork clone`.
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Patches repo for a checkout that has no `.patchwork/` yet.
    #[arg(long)]
    pub patches_repo: Option<PathBuf>,

    /// Checkout name when bootstrapping (default: directory name).
    #[arg(long)]
    pub name: Option<String>,

    /// Apply even if HEAD is not the recorded base commit.
    #[arg(long = "no-verify-base", action = ArgAction::SetFalse)]
    pub verify_base: bool,

    /// Reset every locally changed file to base before applying.
    #[arg(long)]
    pub clean: bool,

    /// Show what would be applied without touching the checkout.
    #[arg(long)]
    pub dry_run: bool,
}

impl CloneArgs {
    pub fn run(self, palette: &Palette) -> Result<Outcome> {
        let runner = SystemGit::new();
        let ctx = self.resolve_context(&runner)?;
        if self.dry_run {
            println!("{}\n", palette.muted("dry run: no files will be modified"));
        }

        let opts = CloneOptions {
            verify_base: self.verify_base,
            clean: self.clean,
            dry_run: self.dry_run,
        };
        let result = clone(&ctx, &runner, &opts).context("clone failed")?;

        print!("{}", render_pull_result(palette, "patchwork clone", &result, self.dry_run));
        print!("{}", render_conflict_report(palette, &result.conflicts));
        if !self.dry_run {
            record_pull(&ctx, &runner, ActivityKind::Clone, &result);
        }
        Ok(Outcome::of(&result))
    }

    /// Existing `.patchwork/` wins; otherwise bootstrap from `--patches-repo`.
    fn resolve_context(&self, runner: &dyn GitRunner) -> Result<Context> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        match load_context_at(&cwd) {
            Ok(ctx) => Ok(ctx),
            Err(ConfigError::NotACheckout { .. }) => {
                let Some(repo) = &self.patches_repo else {
                    bail!("no .patchwork/ found; pass --patches-repo <dir> or run `patchwork init`");
                };
                let mut opts = InitOptions::new(cwd.join(repo));
                opts.name = self.name.clone();
                let config = config_for(&cwd, &opts);
                bootstrap(&cwd, runner, &config, !self.dry_run)
                    .context("could not set up checkout from --patches-repo")
            }
            Err(e) => Err(e).context("failed to load .patchwork/config.yaml"),
        }
    }
}
