//! Error types for patchwork-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or writing checkout configuration and patch-repo markers.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No `.patchwork/` directory between the start directory and the filesystem root.
    #[error("not a patchwork checkout (no .patchwork/ found above {start})")]
    NotACheckout { start: PathBuf },

    /// `init` target lacks `.git` or one of the expected marker directories.
    #[error("{dir} does not look like an upstream checkout (expected .git and {})", .markers.join(", "))]
    NotUpstreamCheckout { dir: PathBuf, markers: Vec<String> },

    /// The base-revision marker file is absent.
    #[error("BASE_COMMIT not found in {repo}; create it with the upstream commit hash")]
    BaseMarkerMissing { repo: PathBuf },

    /// The base-revision marker file exists but is blank.
    #[error("BASE_COMMIT is empty in {repo}")]
    BaseMarkerEmpty { repo: PathBuf },

    /// The patch store directory does not exist inside the patches repo.
    #[error("patches directory not found: {path}")]
    StoreMissing { path: PathBuf },

    /// `init` was run twice.
    #[error("{path} already exists; checkout already initialized")]
    AlreadyInitialized { path: PathBuf },
}

/// A diff chunk that does not start with the `diff --git ` header.
///
/// This signals a contract violation by the tool that produced the diff.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unexpected diff header: {header:?}")]
pub struct ParseError {
    pub header: String,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
