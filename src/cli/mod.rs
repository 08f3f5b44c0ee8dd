//! Command-line interface for the climate concierge.
//!
//! Provides the `run` command, which executes the full agent pipeline and
//! prints the plan highlights.

mod commands;

pub use commands::{highlights, parse_cli, run, run_with_cli, Cli, Commands, RunArgs};
