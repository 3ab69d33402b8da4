//! Patch application with an ordered fallback chain.
//!
//! Strict, three-way and whitespace-fixing applies are tried in turn; the
//! first to exit 0 wins. When all of them fail the patch goes through reject
//! mode, which applies what it can, leaves `.rej` sidecars for the rest and
//! yields a [`ConflictInfo`].

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use patchwork_core::ConflictInfo;

use crate::error::{io_err, GitError};
use crate::runner::Git;

static FAILED_HUNKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) out of (\d+) hunks? FAILED").expect("valid regex"));
static TOTAL_HUNKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Applying patch .* with (\d+) hunks?").expect("valid regex"));
static REJECTED_HUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Rejected hunk #\d+").expect("valid regex"));
static CLEAN_HUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Hunk #\d+ applied cleanly").expect("valid regex"));

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One `git apply` flavour in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStrategy {
    pub name: &'static str,
    pub args: &'static [&'static str],
}

/// Tiers tried before falling back to reject mode, in order.
pub const APPLY_CHAIN: &[ApplyStrategy] = &[
    ApplyStrategy {
        name: "strict",
        args: &["apply", "-p1"],
    },
    ApplyStrategy {
        name: "3way",
        args: &["apply", "-p1", "--3way"],
    },
    ApplyStrategy {
        name: "whitespace-fix",
        args: &["apply", "-p1", "--whitespace=fix"],
    },
];

/// Terminal tier.
pub const REJECT_STRATEGY: ApplyStrategy = ApplyStrategy {
    name: "reject",
    args: &[
        "apply",
        "--reject",
        "--ignore-whitespace",
        "--whitespace=nowarn",
        "-p1",
    ],
};

/// Result of running a patch through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Applied in full by the named tier.
    Clean(&'static str),
    /// Reject mode left failed hunks behind.
    Conflict(ConflictInfo),
}

/// Verdict of a side-effect-free `git apply --check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyCheck {
    pub ok: bool,
    pub diagnostics: String,
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Run `patch` through `strategies` until one exits 0.
///
/// A non-zero exit moves on to the next tier. Spawn failures and timeouts
/// abort the chain.
pub fn try_in_order(
    git: &Git<'_>,
    strategies: &[ApplyStrategy],
    patch: &[u8],
) -> Result<Option<&'static str>, GitError> {
    for strategy in strategies {
        let out = git.run(strategy.args, Some(patch), git.apply_timeout())?;
        if out.success() {
            return Ok(Some(strategy.name));
        }
        tracing::debug!(
            "apply tier {} failed: {}",
            strategy.name,
            out.stderr_lossy().trim()
        );
    }
    Ok(None)
}

/// Apply `patch` for tracked path `file`, recording `patch_file` as its source.
pub fn apply(
    git: &Git<'_>,
    patch: &[u8],
    file: &str,
    patch_file: &Path,
) -> Result<ApplyOutcome, GitError> {
    if let Some(tier) = try_in_order(git, APPLY_CHAIN, patch)? {
        return Ok(ApplyOutcome::Clean(tier));
    }

    let out = git.run(REJECT_STRATEGY.args, Some(patch), git.apply_timeout())?;
    if out.success() {
        return Ok(ApplyOutcome::Clean(REJECT_STRATEGY.name));
    }

    let stderr = out.stderr_lossy();
    let (hunks_failed, hunks_total) = parse_reject_diagnostics(&stderr);
    tracing::warn!("{file}: conflict after all apply tiers");
    Ok(ApplyOutcome::Conflict(ConflictInfo {
        file: file.to_string(),
        reject_file: format!("{file}.rej"),
        patch_file: patch_file.to_path_buf(),
        hunks_total,
        hunks_failed,
        error: stderr.trim().to_string(),
    }))
}

/// Read a patch from disk and apply it.
pub fn apply_patch_file(
    git: &Git<'_>,
    patch_file: &Path,
    file: &str,
) -> Result<ApplyOutcome, GitError> {
    let content = std::fs::read(patch_file).map_err(|e| io_err(patch_file, e))?;
    apply(git, &content, file, patch_file)
}

/// Strict dry run: reports whether `patch` would apply, without touching the tree.
pub fn apply_check(git: &Git<'_>, patch: &[u8]) -> Result<ApplyCheck, GitError> {
    let out = git.run(&["apply", "--check", "-p1"], Some(patch), git.apply_timeout())?;
    Ok(ApplyCheck {
        ok: out.success(),
        diagnostics: out.stderr_lossy().trim().to_string(),
    })
}

/// `(failed, total)` hunk counts from reject-mode diagnostics.
///
/// `"k out of n hunks FAILED"` gives both. `"Applying patch … with n hunks"`
/// alone means every hunk failed. Failing those, git's per-hunk
/// `Rejected hunk #i` / `Hunk #i applied cleanly` lines are counted. Anything
/// else is unknown rather than zero.
pub fn parse_reject_diagnostics(stderr: &str) -> (Option<usize>, Option<usize>) {
    if let Some(caps) = FAILED_HUNKS.captures(stderr) {
        return (caps[1].parse().ok(), caps[2].parse().ok());
    }
    if let Some(caps) = TOTAL_HUNKS.captures(stderr) {
        let total = caps[1].parse().ok();
        return (total, total);
    }
    let rejected = REJECTED_HUNK.find_iter(stderr).count();
    if rejected > 0 {
        let clean = CLEAN_HUNK.find_iter(stderr).count();
        return (Some(rejected), Some(rejected + clean));
    }
    (None, None)
}
