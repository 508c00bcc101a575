//! # gitclone CLI
//!
//! This is the binary entry point for the `gitclone` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into
//!   user-friendly output and a non-zero exit code.
//!
//! The core application logic is defined in the `lib.rs` library crate, ensuring
//! that the binary is a thin wrapper around the reusable library functionality.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let debug = cli.debug();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if debug {
                eprintln!("gitclone fatal: {:?}", error);
            } else {
                eprintln!("gitclone fatal: {:#}", error);
            }
            ExitCode::FAILURE
        }
    }
}
