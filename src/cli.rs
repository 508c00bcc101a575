//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Clone many git repositories at once, throttled per server
#[derive(Parser, Debug)]
#[command(name = "gitclone")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute; `clone` when omitted
    #[command(subcommand)]
    command: Option<Commands>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone a single repository, or everything listed in gitclone.yaml and gitclone.txt
    Clone(commands::clone::CloneArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Whether the full error chain should be printed on failure.
    pub fn debug(&self) -> bool {
        matches!(&self.command, Some(Commands::Clone(args)) if args.debug)
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let clone_args = match self.command {
            Some(Commands::Completions(args)) => return commands::completions::execute(args),
            Some(Commands::Clone(args)) => args,
            None => commands::clone::CloneArgs::default(),
        };

        let level = if clone_args.verbose || clone_args.debug {
            "debug"
        } else {
            self.log_level.as_str()
        };
        init_logging(level);

        commands::clone::execute(clone_args, &self.color)
    }
}

/// Install `env_logger` at `level`. `RUST_LOG` takes precedence.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under the test harness.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
