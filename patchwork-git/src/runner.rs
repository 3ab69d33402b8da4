//! Subprocess seam: every git invocation goes through a [`GitRunner`].
//!
//! [`SystemGit`] spawns the real binary with a per-call deadline. Tests swap
//! in a scripted runner so the apply chain and the sync workflows can be
//! exercised without a checkout.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::GitError;

pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_APPLY_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

/// Captured result of a finished git process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GitOutput {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs `git <args>` in `dir`.
///
/// A non-zero exit is returned as an `Ok` output; only spawn failures and
/// timeouts are errors.
pub trait GitRunner: Send + Sync {
    fn run(
        &self,
        dir: &Path,
        args: &[&str],
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<GitOutput, GitError>;
}

/// The `git` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: String,
}

impl SystemGit {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl GitRunner for SystemGit {
    fn run(
        &self,
        dir: &Path,
        args: &[&str],
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<GitOutput, GitError> {
        let command = args.join(" ");
        tracing::debug!("git {command} (in {})", dir.display());

        let mut child = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Feed stdin and drain both pipes on their own threads so a large
        // patch or a chatty diff cannot deadlock against a full pipe buffer.
        let writer = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                let bytes = bytes.to_vec();
                Some(thread::spawn(move || {
                    let _ = pipe.write_all(&bytes);
                }))
            }
            _ => None,
        };
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let mut interval = Duration::from_millis(1);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GitError::Timeout { command, timeout });
                }
                Ok(None) => {
                    thread::sleep(interval);
                    interval = (interval * 2).min(MAX_POLL_INTERVAL);
                }
                Err(source) => return Err(GitError::Spawn { command, source }),
            }
        };

        if let Some(writer) = writer {
            let _ = writer.join();
        }
        Ok(GitOutput {
            code: status.code(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Git handle
// ---------------------------------------------------------------------------

/// A runner bound to one working directory and its timeouts.
///
/// The typed operations (`diff_*`, `rev_parse`, `checkout_files`, `apply`)
/// are implemented on this handle across the crate's modules.
#[derive(Clone, Copy)]
pub struct Git<'a> {
    runner: &'a dyn GitRunner,
    dir: &'a Path,
    timeout: Duration,
    apply_timeout: Duration,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn GitRunner, dir: &'a Path) -> Self {
        Self {
            runner,
            dir,
            timeout: DEFAULT_GIT_TIMEOUT,
            apply_timeout: DEFAULT_APPLY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, timeout: Duration, apply_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.apply_timeout = apply_timeout;
        self
    }

    pub fn dir(&self) -> &'a Path {
        self.dir
    }

    pub fn apply_timeout(&self) -> Duration {
        self.apply_timeout
    }

    /// Raw invocation; the caller inspects the exit code.
    pub fn run(
        &self,
        args: &[&str],
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<GitOutput, GitError> {
        self.runner.run(self.dir, args, stdin, timeout)
    }

    /// Stdout of a call that must exit 0.
    pub(crate) fn output(&self, args: &[&str]) -> Result<Vec<u8>, GitError> {
        let out = self.run(args, None, self.timeout)?;
        if !out.success() {
            return Err(GitError::Failed {
                command: args.join(" "),
                code: out.code,
                stderr: out.stderr_lossy().trim().to_string(),
            });
        }
        Ok(out.stdout)
    }

    /// Exit status of a yes/no query such as `cat-file -e`.
    pub(crate) fn succeeds(&self, args: &[&str]) -> Result<bool, GitError> {
        Ok(self.run(args, None, self.timeout)?.success())
    }
}
