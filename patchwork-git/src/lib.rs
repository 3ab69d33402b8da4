//! # patchwork-git
//!
//! Typed git invocations for patch synchronisation.
//!
//! Everything runs through a [`GitRunner`]; [`Git`] binds a runner to a
//! working directory and carries the per-call timeouts. The apply engine in
//! [`apply`] layers the strict → 3-way → whitespace → reject chain on top.

pub mod apply;
pub mod checkout;
pub mod diff;
pub mod error;
pub mod rev;
pub mod runner;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use apply::{apply, apply_check, apply_patch_file, ApplyCheck, ApplyOutcome, ApplyStrategy};
pub use diff::{parse_name_status, ChangedPath};
pub use error::GitError;
pub use rev::short_rev;
pub use runner::{Git, GitOutput, GitRunner, SystemGit};
