//! # Per-Server Throttled Clone Scheduler
//!
//! The [`Scheduler`] takes a batch of [`CloneJob`]s and runs them
//! concurrently while bounding how many clones talk to the same server at
//! once, and how many run overall.
//!
//! ## Design
//!
//! - Jobs are grouped by [`CloneJob::base_url`] into FIFO queues, in the
//!   order servers are first seen.
//! - A single controlling loop launches jobs, one scoped thread each. On
//!   every pass it visits all servers and launches from each until that
//!   server's limit or the global limit is reached, so one busy server
//!   cannot drain its whole queue before the others start.
//! - Finished threads publish their job id on a channel. The controller
//!   blocks on that channel, joins the thread and frees its slots. The
//!   per-server and global counters are only ever touched by the
//!   controller.
//! - Each execution unit records exactly one outcome, keyed by destination,
//!   in a [`ResultCollector`] owned by the run. A job whose destination was
//!   already claimed by an earlier job is never launched and is reported as
//!   a failure instead.
//! - A failing job never stops its siblings. Once everything has finished,
//!   all failures are returned together as [`CloneFailures`].

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, ScopedJoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::defaults;
use crate::error::{CloneFailure, CloneFailures, Error, Result};
use crate::git::CloneExecutor;
use crate::progress::{NoProgress, ProgressReporter};
use crate::repository::CloneJob;

/// Concurrency limits for a scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Clones allowed at once against a single `base_url`.
    pub max_per_server: usize,
    /// Clones allowed at once overall.
    pub max_total: usize,
    /// Longest the controller waits for a completion before re-checking
    /// for cancellation.
    pub poll_interval: Duration,
}

impl Limits {
    /// Limits with the given bounds; zero is raised to one.
    pub fn new(max_per_server: usize, max_total: usize) -> Self {
        Self {
            max_per_server: max_per_server.max(1),
            max_total: max_total.max(1),
            poll_interval: defaults::POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::new(
            defaults::MAX_CONNECTIONS_PER_SERVER,
            defaults::MAX_CONNECTIONS_TOTAL,
        )
    }
}

/// Shared flag asking a running scheduler to stop launching jobs.
///
/// Clones already running are allowed to finish; jobs still queued are
/// reported as [`Error::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of every job of one run, in the order they were recorded.
///
/// Each destination holds one outcome. A later success for the same
/// destination is ignored, but a later failure replaces a recorded success.
#[derive(Debug, Default)]
pub struct ResultCollector {
    entries: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    order: Vec<(PathBuf, Option<Error>)>,
    index: HashMap<PathBuf, usize>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `dest`. Returns false if `dest` already had
    /// one.
    pub fn record(&self, dest: &Path, outcome: Result<()>) -> Result<bool> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;

        let slot = entries.index.get(dest).copied();
        let Some(slot) = slot else {
            let slot = entries.order.len();
            entries.order.push((dest.to_path_buf(), outcome.err()));
            entries.index.insert(dest.to_path_buf(), slot);
            return Ok(true);
        };

        if let Err(error) = outcome {
            let recorded = &mut entries.order[slot].1;
            if let Some(first) = recorded.as_ref() {
                warn!(
                    "{} already failed with {}, also failed with {}",
                    dest.display(),
                    first,
                    error
                );
            } else {
                warn!("Second outcome for {} is a failure: {}", dest.display(), error);
                *recorded = Some(error);
            }
        }
        Ok(false)
    }

    pub fn contains(&self, dest: &Path) -> Result<bool> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.index.contains_key(dest))
    }

    /// Consume the collector, keeping only the failures.
    pub fn into_failures(self) -> Result<CloneFailures> {
        let entries = self.entries.into_inner().map_err(|_| poisoned())?;
        Ok(CloneFailures::new(
            entries
                .order
                .into_iter()
                .filter_map(|(dest, error)| error.map(|error| CloneFailure { dest, error }))
                .collect(),
        ))
    }
}

fn poisoned() -> Error {
    Error::LockPoisoned {
        context: "clone results".to_string(),
    }
}

/// Jobs waiting for one server, plus how many of its jobs are running.
struct ServerQueue {
    base_url: String,
    pending: VecDeque<CloneJob>,
    active: usize,
}

struct InFlight<'scope> {
    server: usize,
    dest: PathBuf,
    handle: ScopedJoinHandle<'scope, ()>,
}

/// Sends the job id when dropped, so the controller hears about the unit
/// even if the executor panics.
struct CompletionNotice {
    id: usize,
    tx: Sender<usize>,
}

impl Drop for CompletionNotice {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

/// Runs a batch of clone jobs with per-server and global concurrency limits.
pub struct Scheduler<'a> {
    servers: Vec<ServerQueue>,
    rejected: Vec<CloneFailure>,
    executor: &'a dyn CloneExecutor,
    progress: &'a dyn ProgressReporter,
    limits: Limits,
    cancel: Option<CancelFlag>,
}

impl<'a> Scheduler<'a> {
    /// Group `jobs` by server. Jobs for the same server keep their order.
    ///
    /// A job whose destination is already taken by an earlier job is never
    /// run; it is reported as [`Error::DuplicateDestination`] by [`run`].
    ///
    /// [`run`]: Scheduler::run
    pub fn new(jobs: impl IntoIterator<Item = CloneJob>, executor: &'a dyn CloneExecutor) -> Self {
        let mut servers: Vec<ServerQueue> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut owners: HashMap<PathBuf, String> = HashMap::new();
        let mut rejected = Vec::new();

        for job in jobs {
            if let Some(first) = owners.get(job.dest()) {
                warn!(
                    "Not cloning {}: {} is already the destination of {}",
                    job.full_url(),
                    job.dest().display(),
                    first
                );
                rejected.push(CloneFailure {
                    dest: job.dest().to_path_buf(),
                    error: Error::DuplicateDestination {
                        dest: job.dest().to_path_buf(),
                        first: first.clone(),
                        second: job.full_url().to_string(),
                    },
                });
                continue;
            }
            owners.insert(job.dest().to_path_buf(), job.full_url().to_string());

            let slot = *index.entry(job.base_url().to_string()).or_insert_with(|| {
                servers.push(ServerQueue {
                    base_url: job.base_url().to_string(),
                    pending: VecDeque::new(),
                    active: 0,
                });
                servers.len() - 1
            });
            servers[slot].pending.push_back(job);
        }

        Self {
            servers,
            rejected,
            executor,
            progress: &NoProgress,
            limits: Limits::default(),
            cancel: None,
        }
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Number of distinct servers in this batch.
    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Number of jobs not yet started.
    pub fn pending_count(&self) -> usize {
        self.servers.iter().map(|s| s.pending.len()).sum()
    }

    /// Run every job to completion.
    ///
    /// Returns [`Error::CloneFailures`] listing every failed job once all
    /// of them have finished.
    pub fn run(self) -> Result<()> {
        let Scheduler {
            mut servers,
            rejected,
            executor,
            progress,
            limits,
            cancel,
        } = self;

        let total_jobs: usize =
            servers.iter().map(|s| s.pending.len()).sum::<usize>() + rejected.len();
        info!(
            "Cloning {} repositories from {} servers",
            total_jobs,
            servers.len()
        );

        let results = ResultCollector::new();
        let (tx, rx) = mpsc::channel::<usize>();

        thread::scope(|scope| -> Result<()> {
            let results = &results;
            let mut in_flight: HashMap<usize, InFlight<'_>> = HashMap::new();
            let mut active_total = 0usize;
            let mut next_id = 0usize;

            loop {
                if cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                    for server in servers.iter_mut() {
                        for job in server.pending.drain(..) {
                            let dest = job.dest().to_path_buf();
                            warn!("Cancelled before start: {}", dest.display());
                            results.record(&dest, Err(Error::Cancelled { dest: dest.clone() }))?;
                        }
                    }
                }

                for (slot, server) in servers.iter_mut().enumerate() {
                    while server.active < limits.max_per_server && active_total < limits.max_total {
                        let Some(job) = server.pending.pop_front() else {
                            break;
                        };
                        server.active += 1;
                        active_total += 1;
                        debug!(
                            "Launching {} ({}/{} active on {})",
                            job.full_url(),
                            server.active,
                            limits.max_per_server,
                            server.base_url
                        );

                        let id = next_id;
                        next_id += 1;
                        let dest = job.dest().to_path_buf();
                        let notice = CompletionNotice { id, tx: tx.clone() };
                        let handle = scope.spawn(move || {
                            let _notice = notice;
                            let outcome = execute(&job, executor, progress);
                            if let Err(e) = &outcome {
                                debug!("Clone of {} failed: {}", job.dest().display(), e);
                            }
                            if let Err(e) = results.record(job.dest(), outcome) {
                                warn!("Could not record result for {}: {}", job.dest().display(), e);
                            }
                        });
                        in_flight.insert(
                            id,
                            InFlight {
                                server: slot,
                                dest,
                                handle,
                            },
                        );
                    }
                }

                let queued = servers.iter().any(|s| !s.pending.is_empty());
                if in_flight.is_empty() && !queued {
                    break;
                }
                if in_flight.is_empty() {
                    continue;
                }

                let first = match rx.recv_timeout(limits.poll_interval) {
                    Ok(id) => id,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };
                let mut finished = vec![first];
                finished.extend(rx.try_iter());

                for id in finished {
                    let Some(unit) = in_flight.remove(&id) else {
                        continue;
                    };
                    if unit.handle.join().is_err() {
                        warn!("Clone of {} panicked", unit.dest.display());
                        results.record(
                            &unit.dest,
                            Err(Error::ExecutionPanicked {
                                dest: unit.dest.clone(),
                            }),
                        )?;
                    }
                    servers[unit.server].active -= 1;
                    active_total -= 1;
                }
            }

            Ok(())
        })?;

        let mut all = rejected;
        all.extend(results.into_failures()?.into_inner());
        let failures = CloneFailures::new(all);
        if failures.is_empty() {
            info!("All {} clones finished", total_jobs);
            Ok(())
        } else {
            info!(
                "{} of {} clones failed",
                failures.len(),
                total_jobs
            );
            Err(Error::CloneFailures(failures))
        }
    }
}

/// The body of one execution unit.
fn execute(
    job: &CloneJob,
    executor: &dyn CloneExecutor,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let dest = job.dest();
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if dest.exists() {
        debug!("{} already exists, not cloning", dest.display());
        return Ok(());
    }

    let sink = progress.start(dest);
    executor.clone_repo(job, sink.as_ref())
}
