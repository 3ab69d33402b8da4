//! Patchwork: keep a directory of source patches in sync with an upstream checkout.
//!
//! # Usage
//!
//! ```text
//! patchwork init --patches-repo <dir> [--name <name>] [--patches-dir <dir>] [--marker <dir>]...
//! patchwork clone [--patches-repo <dir>] [--no-verify-base] [--clean] [--dry-run]
//! patchwork pull [--dry-run] [files...]
//! patchwork push [--dry-run] [files...]
//! patchwork status [--json] [--files]
//! patchwork diff [--direction push|pull] [--patch] [files...]
//! ```
//!
//! Exit codes: 0 success, 1 error, 2 completed with conflicts.

mod commands;
mod report;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    clone::CloneArgs, diff::DiffArgs, init::InitArgs, pull::PullArgs, push::PushArgs,
    status::StatusArgs, Outcome,
};
use report::Palette;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "patchwork",
    version,
    about = "Sync a directory of source patches with an upstream checkout",
    long_about = None,
)]
struct Cli {
    /// Log per-file decisions (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable coloured output (NO_COLOR is honoured too).
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register this checkout with a patches repo.
    Init(InitArgs),

    /// Apply every stored patch to the checkout.
    Clone(CloneArgs),

    /// Apply new and changed patches from the patches repo.
    Pull(PullArgs),

    /// Record local changes into the patches repo.
    Push(PushArgs),

    /// Show how the checkout and the patches repo differ.
    Status(StatusArgs),

    /// Preview what push or pull would do.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn dispatch(command: Commands, palette: &Palette) -> Result<Outcome> {
    match command {
        Commands::Init(args) => args.run(palette),
        Commands::Clone(args) => args.run(palette),
        Commands::Pull(args) => args.run(palette),
        Commands::Push(args) => args.run(palette),
        Commands::Status(args) => args.run(palette),
        Commands::Diff(args) => args.run(palette),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let palette = Palette::new(cli.no_color);

    match dispatch(cli.command, &palette) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Conflicts) => ExitCode::from(2),
        Err(err) => {
            eprintln!("{} {err:#}", palette.error("error:"));
            ExitCode::from(1)
        }
    }
}
