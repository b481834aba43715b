//! Command-line interface for perfsink.
//!
//! This module provides the CLI structure for the `perfsink` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, IngestCommand, ServeCommand};

use crate::config::Config;
use crate::logging::Verbosity;

/// perfsink - Collect performance run submissions
///
/// Accepts JSON payloads and appends each one, unchanged, to a run file
/// named after the second it arrived in.
#[derive(Debug, Parser)]
#[command(name = "perfsink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP ingest server
    Serve(ServeCommand),

    /// Store a single payload read from standard input
    Ingest(IngestCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        match &self.command {
            Command::Serve(cmd) => {
                if let Some(bind) = &cmd.bind {
                    config.server.bind.clone_from(bind);
                }
                if let Some(dir) = &cmd.dir {
                    config.storage.dir.clone_from(dir);
                }
            }
            Command::Ingest(cmd) => {
                if let Some(dir) = &cmd.dir {
                    config.storage.dir.clone_from(dir);
                }
            }
            Command::Config(_) => {}
        }
    }
}
