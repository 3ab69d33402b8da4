//! Revision lookups.

use crate::error::GitError;
use crate::runner::Git;

impl Git<'_> {
    /// `git rev-parse <rev>`, trimmed.
    pub fn rev_parse(&self, rev: &str) -> Result<String, GitError> {
        let out = self.output(&["rev-parse", rev])?;
        Ok(String::from_utf8_lossy(&out).trim().to_string())
    }

    pub fn head_rev(&self) -> Result<String, GitError> {
        self.rev_parse("HEAD")
    }

    /// Whether `commit` names a commit object in this repository.
    pub fn commit_exists(&self, commit: &str) -> Result<bool, GitError> {
        self.succeeds(&["cat-file", "-e", &format!("{commit}^{{commit}}")])
    }

    /// Whether `path` is present in the tree of `commit`.
    pub fn file_exists_in_commit(&self, commit: &str, path: &str) -> Result<bool, GitError> {
        self.succeeds(&["cat-file", "-e", &format!("{commit}:{path}")])
    }
}

/// First twelve characters of a revision, for display.
pub fn short_rev(rev: &str) -> &str {
    rev.get(..12).unwrap_or(rev)
}
