//! Command-line interface for balloonwatch.
//!
//! This module provides the CLI structure for the `bwatch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub use commands::{ConfigCommand, NarrateCommand, OutputFormat, SnapshotCommand, WindowCommand};

/// bwatch - Track a balloon constellation
///
/// Fetches hourly balloon positions, rebuilds trajectories over the last
/// 24 hours, summarizes the fleet, and flags anomalous behavior.
#[derive(Debug, Parser)]
#[command(name = "bwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Narrate command arguments.
#[derive(Debug, Args)]
pub struct NarrateArgs {
    /// Number of hourly snapshots to analyze (clamped to 24; defaults to config)
    #[arg(long)]
    pub hours: Option<u32>,

    /// What to narrate
    #[command(subcommand)]
    pub command: NarrateCommand,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show validated positions from one hourly snapshot
    Snapshot(SnapshotCommand),

    /// Show all positions over a window of hours
    History(WindowCommand),

    /// Show per-balloon trajectories
    Trajectories(WindowCommand),

    /// Show descriptive statistics
    Summary(WindowCommand),

    /// Show detected anomalies
    Anomalies(WindowCommand),

    /// Generate narrative analysis
    Narrate(NarrateArgs),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
