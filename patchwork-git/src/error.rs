//! Error types for patchwork-git.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures of a git subprocess that are not tool-reported conflicts.
#[derive(Debug, Error)]
pub enum GitError {
    /// The process could not be started or waited on.
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its deadline and was killed.
    #[error("git {command}: timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// Non-zero exit where the caller required success.
    #[error("git {command} exited with {}: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Reading a patch file from disk.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| format!("status {c}"))
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}
