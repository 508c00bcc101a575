//! # gitclone
//!
//! Clone many git repositories in one go. Repositories are given as
//! compact specification strings, collected from the command line or the
//! `gitclone.yaml` / `gitclone.txt` files, and cloned concurrently with a
//! cap on how many clones hit the same server at once.
//!
//! ## Quick Example
//!
//! ```
//! use gitclone::repository::{self, Delimiter};
//!
//! let job = repository::parse("git@github.com:evyli/gitclone.git@dev tools/gc").unwrap();
//! assert_eq!(job.base_url(), "git@github.com");
//! assert_eq!(job.delimiter(), Delimiter::Colon);
//! assert_eq!(job.branch(), Some("dev"));
//! assert_eq!(job.dest(), std::path::Path::new("tools/gc"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Specifications (`repository`)**: `url[@branch] [dest]` strings parsed
//!   into immutable `CloneJob`s.
//! - **Scheduling (`scheduler`)**: runs jobs on scoped threads, at most
//!   `max_per_server` per `base_url` and `max_total` overall, and reports
//!   every failure together once all jobs are done.
//! - **Execution (`git`)**: the `CloneExecutor` trait and `SystemGit`, which
//!   shells out to `git clone` and turns its stderr into progress updates.
//! - **Configuration (`config`, `autofetch`)**: the YAML and text
//!   configuration files, and GitHub account listing.
//! - **Orchestration (`clone`)**: dedupe, destination resolution and
//!   skip-existing in front of the scheduler.

pub mod autofetch;
pub mod clone;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod output;
pub mod progress;
pub mod repository;
pub mod scheduler;
pub mod suggestions;

#[cfg(test)]
mod repository_proptest;
