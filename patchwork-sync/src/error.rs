//! Error types for patchwork-sync.

use std::path::PathBuf;

use thiserror::Error;

use patchwork_core::{ConfigError, ParseError};
use patchwork_git::GitError;
use patchwork_renderer::RenderError;

/// All errors that can abort a sync workflow.
///
/// Conflicts are not errors; they are reported in `PullResult::conflicts`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `git diff` produced a section without a file header.
    #[error("diff parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Git(#[from] GitError),

    /// A git failure while applying one tracked path.
    #[error("applying {file}: {source}")]
    Apply {
        file: String,
        #[source]
        source: GitError,
    },

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `clone --verify-base` found the checkout on another revision.
    #[error("HEAD ({head}) does not match BASE_COMMIT ({base}); pass --no-verify-base to skip")]
    BaseMismatch { head: String, base: String },

    /// The base revision is not in the checkout's history.
    #[error("BASE_COMMIT {commit} not found in this checkout's git history")]
    UnknownBaseCommit { commit: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
