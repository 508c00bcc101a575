//! # CLI Command Implementations
//!
//! Each subcommand of the `gitclone` command-line tool lives in its own
//! file, with:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `gitclone` library.

pub mod clone;
pub mod completions;
