//! Error types for patchwork-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering activity-log entries.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (syntax, missing variable, context build).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
