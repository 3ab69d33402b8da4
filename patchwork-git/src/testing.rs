//! Scripted [`GitRunner`] for tests.
//!
//! Enabled for this crate's own tests and, through the `test-support`
//! feature, for downstream crates that need to drive the sync workflows
//! without a real checkout.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::GitError;
use crate::runner::{GitOutput, GitRunner};

/// One invocation seen by a [`FakeGit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
}

type Handler = dyn Fn(&[String], Option<&[u8]>) -> Result<GitOutput, GitError> + Send + Sync;

/// Answers every call from a closure and records what it was asked.
pub struct FakeGit {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeGit {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&[String], Option<&[u8]>) -> GitOutput + Send + Sync + 'static,
    {
        Self::fallible(move |args, stdin| Ok(handler(args, stdin)))
    }

    pub fn fallible<F>(handler: F) -> Self
    where
        F: Fn(&[String], Option<&[u8]>) -> Result<GitOutput, GitError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call times out.
    pub fn timing_out() -> Self {
        Self::fallible(|args, _| {
            Err(GitError::Timeout {
                command: args.join(" "),
                timeout: Duration::from_secs(60),
            })
        })
    }

    pub fn ok(stdout: impl Into<Vec<u8>>) -> GitOutput {
        GitOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn fail(code: i32, stderr: &str) -> GitOutput {
        GitOutput {
            code: Some(code),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Calls whose first argument is `subcommand`.
    pub fn calls_to(&self, subcommand: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(subcommand))
            .collect()
    }
}

impl GitRunner for FakeGit {
    fn run(
        &self,
        _dir: &Path,
        args: &[&str],
        stdin: Option<&[u8]>,
        _timeout: Duration,
    ) -> Result<GitOutput, GitError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                args: args.clone(),
                stdin: stdin.map(<[u8]>::to_vec),
            });
        (self.handler)(&args, stdin)
    }
}
