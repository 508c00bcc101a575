//! # Error Handling
//!
//! This module defines the centralized error type for `gitclone`. It uses
//! the `thiserror` library to build one `Error` enum covering every failure
//! mode of the library, from a malformed repository specification to the
//! aggregated report produced after a batch of clones.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (the
//!   raw input string, the URL, the destination) to produce a useful
//!   message without further lookups.
//!
//! - **`CloneFailures`**: The aggregated error returned by the scheduler once
//!   every job has reached a terminal state. It keeps a structured list of
//!   `(destination, cause)` pairs and only renders them to text in its
//!   `Display` implementation.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// How a `git clone` invocation failed, derived from its stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitFailureKind {
    /// The remote repository does not exist or is not visible.
    NotFound,
    /// Credentials were rejected or missing.
    Auth,
    /// Anything else (network, local path collision, ...).
    Other,
}

/// Main error type for gitclone operations
#[derive(Error, Debug)]
pub enum Error {
    /// A repository specification string could not be decomposed into a
    /// clone job.
    #[error(
        "Got invalid repository url '{repostr}'\n  \
         Expected url@branch directory, url directory, or just url"
    )]
    RepositoryFormat { repostr: String },

    /// `git clone` failed for a single repository.
    #[error("Git clone error for {url}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        kind: GitFailureKind,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// The `git` binary could not be executed.
    #[error("Git is not installed or not on PATH: {message}")]
    GitNotInstalled { message: String },

    /// An error occurred while reading or validating a configuration file.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// Listing repositories for an autofetch entry failed.
    #[error("Autofetch failed for user '{user}': {message}")]
    Autofetch { user: String, message: String },

    /// Two distinct repositories resolve to the same destination.
    #[error("Both {first} and {second} would be cloned into {}", dest.display())]
    DuplicateDestination {
        dest: PathBuf,
        first: String,
        second: String,
    },

    /// The job was still queued when the run was cancelled.
    #[error("Clone cancelled before it started: {}", dest.display())]
    Cancelled { dest: PathBuf },

    /// The execution unit for this destination panicked.
    #[error("Clone of {} panicked", dest.display())]
    ExecutionPanicked { dest: PathBuf },

    /// An error indicating that a mutex has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// One or more clones failed. Raised only after every job finished.
    #[error(transparent)]
    CloneFailures(#[from] CloneFailures),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An HTTP error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Returns true when this is a clone failure caused by a missing remote.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::GitClone {
                kind: GitFailureKind::NotFound,
                ..
            }
        )
    }
}

/// One failed clone inside a [`CloneFailures`] report.
#[derive(Debug)]
pub struct CloneFailure {
    pub dest: PathBuf,
    pub error: Error,
}

/// The aggregated error of a scheduler run.
///
/// Failures are kept in the order their results were recorded.
#[derive(Debug, Default)]
pub struct CloneFailures {
    failures: Vec<CloneFailure>,
}

impl CloneFailures {
    pub fn new(failures: Vec<CloneFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[CloneFailure] {
        &self.failures
    }

    pub fn into_inner(self) -> Vec<CloneFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Destinations of every failed job.
    pub fn destinations(&self) -> impl Iterator<Item = &PathBuf> {
        self.failures.iter().map(|f| &f.dest)
    }
}

impl fmt::Display for CloneFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of the requested repositories could not be cloned:",
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}: ", failure.dest.display())?;
            if failure.error.is_not_found() {
                write!(
                    f,
                    "remote repository not found ({})\n    \
                     hint: check the URL for typos and that you have access to the repository",
                    failure.error
                )?;
            } else {
                write!(f, "{}", failure.error)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CloneFailures {}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
