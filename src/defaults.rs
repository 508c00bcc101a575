//! Default values for gitclone configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::time::Duration;

/// YAML configuration file read from the working directory.
pub const CONFIG_FILE: &str = "gitclone.yaml";

/// Plain-text list of repository specifications, one per line.
pub const TEXT_CONFIG_FILE: &str = "gitclone.txt";

/// Concurrent clones allowed against one server.
pub const MAX_CONNECTIONS_PER_SERVER: usize = 6;

/// Concurrent clones allowed overall.
pub const MAX_CONNECTIONS_TOTAL: usize = usize::MAX;

/// Longest the scheduler waits for a completion before re-checking
/// cancellation.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Root directory for relative destinations.
pub fn default_dest_root() -> String {
    ".".to_string()
}

/// Path template for autofetched repositories.
pub fn default_autofetch_path() -> String {
    "{repo}".to_string()
}
