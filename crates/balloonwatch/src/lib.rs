//! `balloonwatch` - trajectory reconstruction and anomaly detection for a
//! balloon constellation.
//!
//! The library polls hourly position snapshots from a telemetry feed,
//! validates them, rebuilds per-balloon trajectories over the last 24 hours,
//! summarizes the fleet, and flags altitude outliers and abrupt movements.
//! Narrative generation and caching sit on top as pluggable collaborators.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod anomaly;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod narrator;
pub mod position;
pub mod report;
pub mod source;
pub mod stats;
pub mod trajectory;

pub use analysis::Analysis;
pub use anomaly::{detect_anomalies, AnomalyRecord, AnomalyReport};
pub use config::Config;
pub use error::{Error, Result};
pub use fetcher::SnapshotFetcher;
pub use logging::init_logging;
pub use position::{Coordinates, Position};
pub use stats::{summarize, Summary};
pub use trajectory::{build_trajectories, Trajectories, Trajectory};
