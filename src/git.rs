//! # Clone Executor
//!
//! The scheduler never talks to `git` directly. It hands each job to a
//! [`CloneExecutor`], which performs one blocking transfer and reports
//! progress through a [`ProgressSink`]. [`SystemGit`] is the production
//! implementation; it runs the installed `git` binary, which automatically
//! handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens embedded in the URL
//! - Any authentication configured in ~/.gitconfig

use std::io::{self, BufReader, Read};
use std::process::{Command, Stdio};

use log::debug;
use regex::Regex;

use crate::error::{Error, GitFailureKind, Result};
use crate::progress::ProgressSink;
use crate::repository::CloneJob;

/// Matches git's progress lines, e.g. `Receiving objects:  45% (45/100), 1.2 MiB`.
const PROGRESS_PATTERN: &str = r"^(?:remote: )?([A-Za-z][A-Za-z ]*):\s+\d+% \((\d+)/(\d+)\)";

/// Performs the transfer for one clone job.
///
/// Implementations block until the transfer is finished. The destination is
/// `job.dest()`; its parent directory already exists when this is called.
pub trait CloneExecutor: Send + Sync {
    fn clone_repo(&self, job: &CloneJob, progress: &dyn ProgressSink) -> Result<()>;
}

/// Clones with the `git` binary found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemGit {
    recurse_submodules: bool,
}

impl SystemGit {
    pub fn new() -> Self {
        Self {
            recurse_submodules: true,
        }
    }

    /// Toggle `--recurse-submodules` (on by default).
    pub fn recurse_submodules(mut self, enabled: bool) -> Self {
        self.recurse_submodules = enabled;
        self
    }

    fn command(&self, job: &CloneJob) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(["clone", "--progress"]);
        if self.recurse_submodules {
            cmd.arg("--recurse-submodules");
        }
        if let Some(branch) = job.branch() {
            cmd.args(["--branch", branch]);
        }
        cmd.arg(job.full_url())
            .arg(job.dest())
            // Never block on an interactive credential prompt.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl CloneExecutor for SystemGit {
    fn clone_repo(&self, job: &CloneJob, progress: &dyn ProgressSink) -> Result<()> {
        debug!("git clone {} -> {}", job.full_url(), job.dest().display());

        let mut child = self.command(job).spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::GitNotInstalled {
                    message: e.to_string(),
                }
            } else {
                clone_error(job, GitFailureKind::Other, e.to_string())
            }
        })?;

        let transcript = match child.stderr.take() {
            Some(stderr) => stream_stderr(stderr, progress)?,
            None => String::new(),
        };
        let status = child.wait()?;

        if status.success() {
            return Ok(());
        }

        let kind = classify_failure(&transcript);
        let message = if transcript.is_empty() {
            format!("git exited with {}", status)
        } else {
            transcript
        };
        Err(clone_error(job, kind, message))
    }
}

fn clone_error(job: &CloneJob, kind: GitFailureKind, message: String) -> Error {
    Error::GitClone {
        url: job.full_url().to_string(),
        kind,
        message,
        hint: hint_for(kind),
    }
}

/// A parsed git progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitProgress {
    pub stage: String,
    pub current: u64,
    pub total: u64,
}

/// Parse one line of `git clone --progress` output.
pub fn parse_progress_line(regex: &Regex, line: &str) -> Option<GitProgress> {
    let captures = regex.captures(line.trim())?;
    Some(GitProgress {
        stage: captures[1].trim().to_string(),
        current: captures[2].parse().ok()?,
        total: captures[3].parse().ok()?,
    })
}

/// Read git's stderr to the end, forwarding progress lines to `progress`.
///
/// Git rewrites progress in place with `\r`, so both `\r` and `\n` end a
/// line. Returns every non-progress line, which is what git prints on
/// failure.
pub fn stream_stderr(stderr: impl Read, progress: &dyn ProgressSink) -> Result<String> {
    let regex = Regex::new(PROGRESS_PATTERN)?;
    let mut transcript: Vec<String> = Vec::new();
    let mut current = Vec::new();

    let mut handle_line = |bytes: &[u8]| {
        let line = String::from_utf8_lossy(bytes);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match parse_progress_line(&regex, line) {
            Some(p) => progress.update(p.current, Some(p.total), &p.stage),
            None if line.starts_with("Cloning into") => {}
            None => transcript.push(line.to_string()),
        }
    };

    for byte in BufReader::new(stderr).bytes() {
        let byte = byte?;
        if byte == b'\r' || byte == b'\n' {
            handle_line(&current);
            current.clear();
        } else {
            current.push(byte);
        }
    }
    handle_line(&current);

    Ok(transcript.join("\n"))
}

/// Classify a failed clone from git's stderr.
pub fn classify_failure(stderr: &str) -> GitFailureKind {
    let lower = stderr.to_lowercase();
    if lower.contains("repository not found")
        || lower.contains("does not appear to be a git repository")
        || lower.lines().any(is_missing_repository_line)
    {
        GitFailureKind::NotFound
    } else if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("could not read from remote repository")
        || lower.contains("could not read username")
    {
        GitFailureKind::Auth
    } else {
        GitFailureKind::Other
    }
}

/// `fatal: repository '<url>' not found`, as printed for a missing HTTP remote.
fn is_missing_repository_line(line: &str) -> bool {
    line.trim()
        .strip_prefix("fatal: repository '")
        .is_some_and(|rest| rest.ends_with("' not found"))
}

fn hint_for(kind: GitFailureKind) -> Option<String> {
    match kind {
        GitFailureKind::Auth => Some(
            "Make sure you have access to the repository. For private repos, ensure you have \
             an SSH key added to ssh-agent, git credentials configured, or a personal access \
             token in the URL"
                .to_string(),
        ),
        GitFailureKind::NotFound | GitFailureKind::Other => None,
    }
}

/// Check that a usable `git` binary is on `PATH` and return its version line.
pub fn ensure_git_installed() -> Result<String> {
    let output = Command::new("git")
        .arg("--version")
        .output()
        .map_err(|e| Error::GitNotInstalled {
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitNotInstalled {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
