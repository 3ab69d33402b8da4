//! Resetting paths to a revision and index bookkeeping for new files.

use crate::error::GitError;
use crate::runner::Git;

impl Git<'_> {
    /// `git checkout <commit> -- <files…>` in a single call. No-op when empty.
    pub fn checkout_files(&self, commit: &str, files: &[String]) -> Result<(), GitError> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["checkout", commit, "--"];
        args.extend(files.iter().map(String::as_str));
        self.output(&args)?;
        tracing::debug!("reset {} file(s) to {commit}", files.len());
        Ok(())
    }

    /// `git add --intent-to-add -- <files…>`. New files then show up in
    /// `git diff <base>`. No-op when empty.
    pub fn intent_to_add(&self, files: &[String]) -> Result<(), GitError> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--intent-to-add", "--"];
        args.extend(files.iter().map(String::as_str));
        self.output(&args)?;
        Ok(())
    }

    /// Drop `files` from the index, leaving the working tree alone. Paths the
    /// index does not know are ignored. No-op when empty.
    pub fn untrack(&self, files: &[String]) -> Result<(), GitError> {
        if files.is_empty() {
            return Ok(());
        }
        let mut args = vec!["rm", "-q", "--cached", "-f", "--ignore-unmatch", "--"];
        args.extend(files.iter().map(String::as_str));
        self.output(&args)?;
        tracing::debug!("untracked {} file(s)", files.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::FakeGit;
    use crate::Git;
    use std::path::Path;

    #[test]
    fn index_updates_are_single_batched_calls() {
        let fake = FakeGit::new(|_, _| FakeGit::ok(""));
        let git = Git::new(&fake, Path::new("/src"));
        let files = vec!["a.h".to_string(), "b/c.cc".to_string()];

        git.intent_to_add(&files).unwrap();
        git.untrack(&files).unwrap();
        git.intent_to_add(&[]).unwrap();
        git.untrack(&[]).unwrap();

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, vec!["add", "--intent-to-add", "--", "a.h", "b/c.cc"]);
        assert_eq!(
            calls[1].args,
            vec!["rm", "-q", "--cached", "-f", "--ignore-unmatch", "--", "a.h", "b/c.cc"]
        );
    }
}
