//! Clone command implementation
//!
//! With a repository argument only that repository is cloned. Otherwise the
//! specifications in `gitclone.yaml` (autofetch results, then
//! `repositories`) and `gitclone.txt` are cloned as one batch.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Args;

use gitclone::autofetch::GithubLister;
use gitclone::clone::{self, CloneOptions};
use gitclone::config::Config;
use gitclone::defaults;
use gitclone::error::Error;
use gitclone::git::{self, SystemGit};
use gitclone::output::{emoji, OutputConfig};
use gitclone::progress::{MultiProgressReporter, NoProgress, ProgressReporter};
use gitclone::scheduler::Limits;
use gitclone::suggestions;

/// Arguments for the clone command
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// Repository to clone: url, url@branch
    #[arg(value_name = "REPOSITORY")]
    pub repository: Option<String>,

    /// Directory to clone into (defaults to the repository name)
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<String>,

    /// Path to the YAML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the plain-text repository list
    #[arg(long, value_name = "PATH")]
    pub text_config: Option<PathBuf>,

    /// Concurrent clones allowed against one server
    #[arg(long, value_name = "N", default_value_t = defaults::MAX_CONNECTIONS_PER_SERVER)]
    pub max_per_server: usize,

    /// Concurrent clones allowed overall (unlimited by default)
    #[arg(long, value_name = "N")]
    pub max_total: Option<usize>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print more log messages during the run
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the full error chain on failure
    #[arg(short, long)]
    pub debug: bool,
}

impl Default for CloneArgs {
    fn default() -> Self {
        Self {
            repository: None,
            directory: None,
            config: None,
            text_config: None,
            max_per_server: defaults::MAX_CONNECTIONS_PER_SERVER,
            max_total: None,
            quiet: false,
            verbose: false,
            debug: false,
        }
    }
}

/// Execute the clone command
pub fn execute(args: CloneArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    out.apply();

    let yaml_path = explicit_or_default(args.config.as_deref(), defaults::CONFIG_FILE)?;
    let text_path = explicit_or_default(args.text_config.as_deref(), defaults::TEXT_CONFIG_FILE)?;

    let version = git::ensure_git_installed().map_err(|e| suggestions::git_not_installed(&e))?;
    log::debug!("Using {}", version);

    let (config, repos) = match &args.repository {
        Some(repository) => {
            let repostr = match &args.directory {
                Some(directory) => format!("{} {}", repository, directory),
                None => repository.clone(),
            };
            (Config::default(), vec![repostr])
        }
        None => {
            let lister = GithubLister::new()?;
            let collected = clone::collect_repositories(&yaml_path, &text_path, &lister)?;
            if !args.quiet {
                for source in &collected.sources {
                    println!(
                        "{} Reading repositories from {}",
                        emoji(&out, "📋", "[READ]"),
                        source.display()
                    );
                }
            }
            (collected.config, collected.repositories)
        }
    };

    if repos.is_empty() {
        if !args.quiet {
            println!("No repositories were specified, nothing to do... exiting");
        }
        return Ok(());
    }

    let options = CloneOptions {
        limits: Limits::new(
            args.max_per_server,
            args.max_total.unwrap_or(defaults::MAX_CONNECTIONS_TOTAL),
        ),
        ..CloneOptions::from_config(&config)
    };

    let bars;
    let progress: &dyn ProgressReporter = if args.quiet {
        &NoProgress
    } else {
        bars = MultiProgressReporter::new();
        &bars
    };

    let executor = SystemGit::new();
    let summary = clone::clone_repos(&repos, &options, &executor, progress).map_err(with_hint)?;

    if !args.quiet {
        if summary.existing > 0 {
            println!(
                "{} {} of {} repositories already existed",
                emoji(&out, "ℹ️", "[INFO]"),
                summary.existing,
                summary.requested
            );
        }
        println!("{} DONE", emoji(&out, "✅", "[OK]"));
    }
    Ok(())
}

/// `explicit` when given (it must exist), else `default` in the working
/// directory (it may be missing).
fn explicit_or_default(explicit: Option<&Path>, default: &str) -> Result<PathBuf> {
    match explicit {
        Some(path) if !path.exists() => Err(suggestions::config_not_found(path)),
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(PathBuf::from(default)),
    }
}

/// Attach a hint to repository specification errors.
fn with_hint(error: Error) -> anyhow::Error {
    match error {
        Error::RepositoryFormat { ref repostr } => {
            let hint = suggestions::repository_format(repostr);
            anyhow!("{}\n  hint: {}", error, hint)
        }
        Error::DuplicateDestination { ref second, .. } => {
            let hint = suggestions::duplicate_destination(second);
            anyhow!("{}\n  hint: {}", error, hint)
        }
        other => other.into(),
    }
}
