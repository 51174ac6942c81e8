//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Snapshot command arguments.
#[derive(Debug, Args)]
pub struct SnapshotCommand {
    /// Hours in the past (0 = most recent, up to 23)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub hours_ago: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments shared by commands that analyze a window of hours.
#[derive(Debug, Args)]
pub struct WindowCommand {
    /// Number of hourly snapshots to fetch (clamped to 24; defaults to config)
    #[arg(long)]
    pub hours: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Narrative commands.
#[derive(Debug, Subcommand)]
pub enum NarrateCommand {
    /// Ask a free-form question about the constellation
    Ask {
        /// The question
        question: String,
    },

    /// General overview of the constellation
    Insights {
        /// Bypass the narrative cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Assessment of detected anomalies
    Anomalies {
        /// Bypass the narrative cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Launch-site recommendations
    Launch {
        /// Bypass the narrative cache
        #[arg(long)]
        no_cache: bool,
    },
}

impl NarrateCommand {
    /// Whether the cache should be bypassed.
    #[must_use]
    pub fn no_cache(&self) -> bool {
        match self {
            Self::Ask { .. } => true,
            Self::Insights { no_cache }
            | Self::Anomalies { no_cache }
            | Self::Launch { no_cache } => *no_cache,
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
