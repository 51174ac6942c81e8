//! Core observation types for balloonwatch.
//!
//! A [`Position`] is one balloon observation taken from one hourly snapshot.
//! Positions live only as long as the analysis that fetched them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of hourly snapshots the source retains. Valid offsets are
/// `0..HOURS_AVAILABLE`.
pub const HOURS_AVAILABLE: u32 = 24;

/// Latitude bounds in degrees, inclusive.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);

/// Longitude bounds in degrees, inclusive.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A validated coordinate triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Degrees north, in `[-90, 90]`.
    pub latitude: f64,
    /// Degrees east, in `[-180, 180]`.
    pub longitude: f64,
    /// Kilometers. Not range-checked.
    pub altitude: f64,
}

/// One balloon observation.
///
/// `balloon_id` is the entry's index within its hourly snapshot (after the
/// leading placeholder is dropped). Trajectory reconstruction assumes the same
/// index names the same balloon in every hour; the source does not guarantee
/// this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Index of the entry within its snapshot.
    pub balloon_id: usize,
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Kilometers.
    pub altitude: f64,
    /// Fetch time minus `hours_ago`.
    pub timestamp: DateTime<Utc>,
    /// Snapshot offset; 0 is the most recent hour.
    pub hours_ago: u32,
}

impl Position {
    /// Build a position observed `hours_ago` hours before `fetched_at`.
    #[must_use]
    pub fn new(
        balloon_id: usize,
        coords: Coordinates,
        hours_ago: u32,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            balloon_id,
            latitude: coords.latitude,
            longitude: coords.longitude,
            altitude: coords.altitude,
            timestamp: fetched_at - Duration::hours(i64::from(hours_ago)),
            hours_ago,
        }
    }

    /// The coordinate triple of this observation.
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
        }
    }

    /// True when the observation lies strictly north of the equator.
    #[must_use]
    pub fn is_northern(&self) -> bool {
        self.latitude > 0.0
    }

    /// True when the observation lies strictly east of the prime meridian.
    #[must_use]
    pub fn is_eastern(&self) -> bool {
        self.longitude > 0.0
    }
}

/// Check that a latitude/longitude pair is inside the accepted bounds.
#[must_use]
pub fn in_bounds(latitude: f64, longitude: f64) -> bool {
    (LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&latitude)
        && (LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&longitude)
}
