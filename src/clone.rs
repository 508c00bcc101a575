//! # Batch Clone Orchestration
//!
//! Glue between the configuration sources and the [`Scheduler`]:
//!
//! 1. [`collect_repositories`] gathers specifications from `gitclone.yaml`
//!    (autofetch results first, then `repositories`) and `gitclone.txt`.
//! 2. [`clone_repos`] parses every one up front, resolves destinations
//!    against the configured root, collapses repeated jobs, refuses two
//!    repositories sharing a destination, drops destinations that already
//!    exist and hands the rest to the scheduler.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::autofetch::{self, RepositoryLister};
use crate::config::{self, Config, TextConfig};
use crate::defaults;
use crate::error::{Error, Result};
use crate::git::CloneExecutor;
use crate::progress::ProgressReporter;
use crate::repository::{self, CloneJob};
use crate::scheduler::{CancelFlag, Limits, Scheduler};

/// Settings for one [`clone_repos`] call.
#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Root for relative destinations. `~` is expanded.
    pub dest_root: String,
    pub limits: Limits,
    pub cancel: Option<CancelFlag>,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            dest_root: defaults::default_dest_root(),
            limits: Limits::default(),
            cancel: None,
        }
    }
}

impl CloneOptions {
    /// Options using the `dest` of a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            dest_root: config.dest.clone(),
            ..Self::default()
        }
    }
}

/// What a successful [`clone_repos`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneSummary {
    /// Distinct jobs requested.
    pub requested: usize,
    /// Destinations that already existed and were left alone.
    pub existing: usize,
    /// Jobs handed to the scheduler.
    pub scheduled: usize,
}

/// Repository specifications gathered from the configuration files.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub config: Config,
    pub repositories: Vec<String>,
    /// Files that were found and read, in reading order.
    pub sources: Vec<PathBuf>,
}

/// Read `yaml_path` and `text_path` if they exist and gather their
/// repository specifications.
pub fn collect_repositories(
    yaml_path: &Path,
    text_path: &Path,
    lister: &dyn RepositoryLister,
) -> Result<Collected> {
    let mut collected = Collected::default();

    if yaml_path.exists() {
        info!("Reading configuration file: {}", yaml_path.display());
        let config = config::from_file(yaml_path)?;
        collected
            .repositories
            .extend(autofetch::expand(&config, lister)?);
        collected
            .repositories
            .extend(config.repositories.iter().cloned());
        collected.config = config;
        collected.sources.push(yaml_path.to_path_buf());
    }

    if text_path.exists() {
        info!(
            "Reading additional repositories from file: {}",
            text_path.display()
        );
        let text = TextConfig::from_file(text_path)?;
        collected.repositories.extend(text.repositories);
        collected.sources.push(text_path.to_path_buf());
    }

    Ok(collected)
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Destination of `job` once `~` is expanded and relative paths are joined
/// onto `root`.
pub fn resolve_dest(job: &CloneJob, root: &Path) -> PathBuf {
    let dest = expand_home(&job.dest().to_string_lossy());
    if dest.is_absolute() {
        dest
    } else {
        root.join(dest)
    }
}

/// Clone every repository in `repos`.
///
/// Specifications that resolve to the same job are collapsed keeping the
/// first occurrence. All specifications are parsed before anything is
/// cloned, so one malformed entry aborts the whole batch, as do two
/// different repositories sharing a destination.
pub fn clone_repos(
    repos: &[String],
    options: &CloneOptions,
    executor: &dyn CloneExecutor,
    progress: &dyn ProgressReporter,
) -> Result<CloneSummary> {
    let root = expand_home(&options.dest_root);
    let parsed = repos
        .iter()
        .map(|repostr| {
            let job = repository::parse(repostr)?;
            let dest = resolve_dest(&job, &root);
            Ok(job.with_dest(dest))
        })
        .collect::<Result<Vec<CloneJob>>>()?;
    let jobs = unique_jobs(parsed)?;

    let requested = jobs.len();
    let (existing, to_clone): (Vec<CloneJob>, Vec<CloneJob>) =
        jobs.into_iter().partition(|job| job.dest().exists());
    for job in &existing {
        debug!("Skipping {}: {} exists", job.full_url(), job.dest().display());
    }

    let summary = CloneSummary {
        requested,
        existing: existing.len(),
        scheduled: to_clone.len(),
    };

    let mut scheduler = Scheduler::new(to_clone, executor)
        .limits(options.limits)
        .progress(progress);
    if let Some(cancel) = &options.cancel {
        scheduler = scheduler.with_cancel(cancel.clone());
    }
    let outcome = scheduler.run();

    if summary.existing > 0 {
        info!(
            "{} of {} repositories already existed",
            summary.existing, summary.requested
        );
    }

    outcome.map(|()| summary)
}

/// Drop repeated jobs keeping first-seen order, and refuse distinct jobs
/// that resolve to the same destination.
fn unique_jobs(jobs: Vec<CloneJob>) -> Result<Vec<CloneJob>> {
    let mut seen = HashSet::new();
    let mut owners: HashMap<PathBuf, String> = HashMap::new();
    let mut unique = Vec::with_capacity(jobs.len());

    for job in jobs {
        if seen.contains(&job) {
            debug!("Ignoring repeated {}", job.full_url());
            continue;
        }
        if let Some(first) = owners.get(job.dest()) {
            return Err(Error::DuplicateDestination {
                dest: job.dest().to_path_buf(),
                first: first.clone(),
                second: job.full_url().to_string(),
            });
        }
        owners.insert(job.dest().to_path_buf(), job.full_url().to_string());
        seen.insert(job.clone());
        unique.push(job);
    }
    Ok(unique)
}
