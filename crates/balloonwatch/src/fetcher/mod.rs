//! Hourly snapshot retrieval.
//!
//! [`SnapshotFetcher`] turns raw snapshot bodies into validated [`Position`]s.
//! Two policies coexist:
//!
//! - **Parameter validation fails loudly.** An `hours_ago` outside
//!   `0..24` is a caller bug and returns [`Error::HoursOutOfRange`].
//! - **Data and transport problems degrade.** A failed request or a body that
//!   is not a JSON array yields an empty snapshot; a bad entry is skipped.
//!
//! # Example
//!
//! ```
//! use balloonwatch::fetcher::SnapshotFetcher;
//! use balloonwatch::source::MemorySource;
//!
//! let source = MemorySource::new().with_body(0, "[null, [10, 20, 5]]");
//! let fetcher = SnapshotFetcher::new(source);
//!
//! let positions = fetcher.fetch_snapshot(0).unwrap();
//! assert_eq!(positions.len(), 1);
//! assert!(fetcher.fetch_snapshot(24).is_err());
//! ```

pub mod validate;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::position::{Position, HOURS_AVAILABLE};
use crate::source::SnapshotSource;

pub use validate::{validate_entries, validate_entry, Rejection, ValidationReport};

/// The raw result of fetching one hour: the entries of the snapshot array.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Offset this snapshot represents.
    pub hours_ago: u32,
    /// When the snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Raw entries, including any leading placeholder.
    pub entries: Vec<Value>,
}

impl Snapshot {
    /// Parse a response body. The body must be a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedSnapshot`] if the body is not valid JSON or
    /// is not an array.
    pub fn parse(
        origin: &str,
        hours_ago: u32,
        fetched_at: DateTime<Utc>,
        body: &str,
    ) -> Result<Self> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::malformed_snapshot(origin, e.to_string()))?;
        let Value::Array(entries) = value else {
            return Err(Error::malformed_snapshot(origin, "body is not a JSON array"));
        };
        Ok(Self {
            hours_ago,
            fetched_at,
            entries,
        })
    }

    /// Validate every entry and build positions for the accepted ones.
    #[must_use]
    pub fn into_positions(self) -> (Vec<Position>, ValidationReport) {
        let report = validate_entries(&self.entries);
        let positions = report
            .accepted
            .iter()
            .map(|&(id, coords)| Position::new(id, coords, self.hours_ago, self.fetched_at))
            .collect();
        (positions, report)
    }
}

/// Retrieves and validates hourly snapshots from a [`SnapshotSource`].
#[derive(Debug)]
pub struct SnapshotFetcher<S, C = SystemClock> {
    source: S,
    clock: C,
}

impl<S: SnapshotSource> SnapshotFetcher<S> {
    /// Create a fetcher that timestamps snapshots with the system clock.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_clock(source, SystemClock)
    }
}

impl<S: SnapshotSource, C: Clock> SnapshotFetcher<S, C> {
    /// Create a fetcher with an explicit clock.
    #[must_use]
    pub fn with_clock(source: S, clock: C) -> Self {
        Self { source, clock }
    }

    /// The underlying source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch and validate the snapshot `hours_ago` hours in the past.
    ///
    /// Transport failures and malformed bodies yield an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HoursOutOfRange`] if `hours_ago` is not in `0..24`.
    pub fn fetch_snapshot(&self, hours_ago: i64) -> Result<Vec<Position>> {
        let hour = check_hours_ago(hours_ago)?;

        match self.fetch_raw(hour) {
            Ok(snapshot) => {
                let (positions, report) = snapshot.into_positions();
                info!(
                    hours_ago = hour,
                    accepted = report.accepted.len(),
                    rejected = report.rejected.len(),
                    "Fetched snapshot"
                );
                Ok(positions)
            }
            Err(e) => {
                warn!(hours_ago = hour, error = %e, "Snapshot unavailable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Fetch the raw snapshot for `hour` without validating entries.
    ///
    /// # Errors
    ///
    /// Returns the source's transport error or [`Error::MalformedSnapshot`].
    pub fn fetch_raw(&self, hour: u32) -> Result<Snapshot> {
        let origin = self.source.locate(hour);
        let fetched_at = self.clock.now();
        let body = self.source.retrieve(hour)?;
        debug!(%origin, bytes = body.len(), "Snapshot body received");
        Snapshot::parse(&origin, hour, fetched_at, &body)
    }

    /// Fetch the `hours` most recent snapshots and concatenate them.
    ///
    /// `hours` is clamped to 24. Hours are fetched one after another; an
    /// unavailable hour contributes nothing and does not affect the others.
    #[must_use]
    pub fn fetch_historical_data(&self, hours: u32) -> Vec<Position> {
        let hours = hours.min(HOURS_AVAILABLE);
        let mut all = Vec::new();

        for hour in 0..hours {
            // In range by construction, so the validation branch is unreachable.
            if let Ok(positions) = self.fetch_snapshot(i64::from(hour)) {
                all.extend(positions);
            }
        }

        info!(hours, positions = all.len(), "Fetched historical data");
        all
    }
}

/// Check that `hours_ago` lies in `0..24`.
///
/// # Errors
///
/// Returns [`Error::HoursOutOfRange`] otherwise.
pub fn check_hours_ago(hours_ago: i64) -> Result<u32> {
    u32::try_from(hours_ago)
        .ok()
        .filter(|h| *h < HOURS_AVAILABLE)
        .ok_or(Error::HoursOutOfRange {
            hours_ago,
            limit: HOURS_AVAILABLE,
        })
}
