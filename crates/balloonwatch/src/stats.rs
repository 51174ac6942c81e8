//! Descriptive statistics over a set of positions.
//!
//! [`summarize`] never fails: an empty input produces [`Summary::NoData`].
//! The movement trend is a planar average of latitude/longitude deltas in
//! degrees. It is a direction hint, not a distance; it ignores the Earth's
//! curvature and longitude wrap-around.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::trajectory::build_trajectories;

/// Latitude of the Arctic and Antarctic circles, in degrees.
pub const POLAR_CIRCLE_LATITUDE: f64 = 66.5;

/// Latitude of the tropics of Cancer and Capricorn, in degrees.
pub const TROPIC_LATITUDE: f64 = 23.5;

/// Aggregate metrics for a position set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    /// The input was empty.
    NoData,
    /// Metrics over a non-empty input.
    Available(ConstellationSummary),
}

/// Metrics over a non-empty position set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationSummary {
    /// Distinct balloon ids.
    pub unique_balloons: usize,
    /// Positions with `hours_ago == 0`.
    pub current_balloons: usize,
    /// Total positions.
    pub observations: usize,
    /// Distinct `hours_ago` values.
    pub hours_covered: usize,
    /// Altitude distribution.
    pub altitude: AltitudeStats,
    /// Observation counts per hemisphere.
    pub hemispheres: HemisphereCounts,
    /// Observation counts per climate band.
    pub climate_bands: ClimateBandCounts,
    /// Net movement, when more than one hour is covered and at least one
    /// balloon was seen twice.
    pub movement: Option<MovementTrend>,
}

/// Altitude min/max/mean in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeStats {
    /// Lowest altitude.
    pub min: f64,
    /// Highest altitude.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

/// Observation counts by hemisphere. Points exactly on the equator or the
/// prime meridian are counted in neither half.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HemisphereCounts {
    /// `latitude > 0`.
    pub north: usize,
    /// `latitude < 0`.
    pub south: usize,
    /// `longitude > 0`.
    pub east: usize,
    /// `longitude < 0`.
    pub west: usize,
}

/// Observation counts by climate band. Temperate latitudes are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimateBandCounts {
    /// `latitude > 66.5`.
    pub arctic: usize,
    /// `latitude < -66.5`.
    pub antarctic: usize,
    /// `-23.5 < latitude < 23.5`.
    pub tropical: usize,
}

/// Average displacement of balloons between their oldest and newest
/// observation (newest minus oldest), in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementTrend {
    /// Mean latitude delta; positive is northward.
    pub mean_latitude_delta: f64,
    /// Mean longitude delta; positive is eastward.
    pub mean_longitude_delta: f64,
    /// Number of balloons averaged.
    pub balloons: usize,
}

impl MovementTrend {
    /// "north", "south", or "no net north/south" movement.
    #[must_use]
    pub fn latitude_heading(&self) -> &'static str {
        heading(self.mean_latitude_delta, "north", "south", "no net north/south")
    }

    /// "east", "west", or "no net east/west" movement.
    #[must_use]
    pub fn longitude_heading(&self) -> &'static str {
        heading(self.mean_longitude_delta, "east", "west", "no net east/west")
    }
}

fn heading(
    delta: f64,
    positive: &'static str,
    negative: &'static str,
    neutral: &'static str,
) -> &'static str {
    if delta > 0.0 {
        positive
    } else if delta < 0.0 {
        negative
    } else {
        neutral
    }
}

/// Arithmetic mean, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation around `mean`, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.max(0.0).sqrt())
}

/// Compute descriptive statistics for `positions`.
#[must_use]
pub fn summarize(positions: &[Position]) -> Summary {
    let altitudes: Vec<f64> = positions.iter().map(|p| p.altitude).collect();
    let Some(mean_altitude) = mean(&altitudes) else {
        return Summary::NoData;
    };

    let altitude = AltitudeStats {
        min: altitudes.iter().copied().fold(f64::INFINITY, f64::min),
        max: altitudes.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: mean_altitude,
    };

    let unique_balloons = positions
        .iter()
        .map(|p| p.balloon_id)
        .collect::<BTreeSet<_>>()
        .len();
    let hours_covered = positions
        .iter()
        .map(|p| p.hours_ago)
        .collect::<BTreeSet<_>>()
        .len();

    let mut hemispheres = HemisphereCounts::default();
    let mut climate_bands = ClimateBandCounts::default();
    for p in positions {
        if p.latitude > 0.0 {
            hemispheres.north += 1;
        } else if p.latitude < 0.0 {
            hemispheres.south += 1;
        }
        if p.longitude > 0.0 {
            hemispheres.east += 1;
        } else if p.longitude < 0.0 {
            hemispheres.west += 1;
        }

        if p.latitude > POLAR_CIRCLE_LATITUDE {
            climate_bands.arctic += 1;
        } else if p.latitude < -POLAR_CIRCLE_LATITUDE {
            climate_bands.antarctic += 1;
        } else if p.latitude.abs() < TROPIC_LATITUDE {
            climate_bands.tropical += 1;
        }
    }

    let movement = if hours_covered > 1 {
        movement_trend(positions)
    } else {
        None
    };

    Summary::Available(ConstellationSummary {
        unique_balloons,
        current_balloons: positions.iter().filter(|p| p.hours_ago == 0).count(),
        observations: positions.len(),
        hours_covered,
        altitude,
        hemispheres,
        climate_bands,
        movement,
    })
}

/// Average newest-minus-oldest displacement over balloons seen at least twice.
#[must_use]
pub fn movement_trend(positions: &[Position]) -> Option<MovementTrend> {
    let (lat_deltas, lon_deltas): (Vec<f64>, Vec<f64>) = build_trajectories(positions)
        .values()
        .filter(|t| t.supports_movement())
        .map(|t| {
            let (newest, oldest) = (t.newest(), t.oldest());
            (
                newest.latitude - oldest.latitude,
                newest.longitude - oldest.longitude,
            )
        })
        .unzip();

    Some(MovementTrend {
        mean_latitude_delta: mean(&lat_deltas)?,
        mean_longitude_delta: mean(&lon_deltas)?,
        balloons: lat_deltas.len(),
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoData => write!(f, "No data available."),
            Self::Available(s) => fmt::Display::fmt(s, f),
        }
    }
}

impl fmt::Display for ConstellationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balloon Constellation Summary:")?;
        writeln!(f, "- Total unique balloons tracked: {}", self.unique_balloons)?;
        writeln!(f, "- Current active balloons: {}", self.current_balloons)?;
        writeln!(
            f,
            "- Observations: {} across {} hour(s)",
            self.observations, self.hours_covered
        )?;
        writeln!(
            f,
            "- Altitude range: {:.2} km to {:.2} km (avg: {:.2} km)",
            self.altitude.min, self.altitude.max, self.altitude.mean
        )?;
        writeln!(f)?;
        writeln!(f, "Geographic Distribution:")?;
        writeln!(f, "- Northern Hemisphere: {} observations", self.hemispheres.north)?;
        writeln!(f, "- Southern Hemisphere: {} observations", self.hemispheres.south)?;
        writeln!(f, "- Eastern Hemisphere: {} observations", self.hemispheres.east)?;
        writeln!(f, "- Western Hemisphere: {} observations", self.hemispheres.west)?;
        writeln!(f, "- Arctic (lat > 66.5): {}", self.climate_bands.arctic)?;
        writeln!(f, "- Antarctic (lat < -66.5): {}", self.climate_bands.antarctic)?;
        writeln!(f, "- Tropical (|lat| < 23.5): {}", self.climate_bands.tropical)?;

        if let Some(m) = &self.movement {
            writeln!(f)?;
            writeln!(f, "Movement Analysis ({} balloons):", m.balloons)?;
            writeln!(
                f,
                "- Average latitude change: {:.2} degrees",
                m.mean_latitude_delta
            )?;
            writeln!(
                f,
                "- Average longitude change: {:.2} degrees",
                m.mean_longitude_delta
            )?;
            writeln!(
                f,
                "- General movement trend: {} and {}.",
                m.latitude_heading(),
                m.longitude_heading()
            )?;
        }

        writeln!(f)?;
        write!(
            f,
            "Each observation carries a balloon ID, latitude and longitude, altitude in \
             kilometers, a timestamp, and hours ago (0 for current)."
        )
    }
}
