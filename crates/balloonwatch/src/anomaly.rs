//! Threshold-based anomaly detection.
//!
//! Two kinds of anomaly are flagged:
//!
//! - **Altitude outliers**: positions more than [`ALTITUDE_SIGMA_THRESHOLD`]
//!   population standard deviations from the mean altitude of the input.
//! - **Movement anomalies**: consecutive observations of one balloon whose
//!   altitude changes by more than [`MAX_ALTITUDE_STEP_KM`] or whose latitude
//!   or longitude changes by more than [`MAX_DEGREE_STEP`].
//!
//! Thresholds are fixed. Free-flying balloons legitimately travel far in an
//! hour, so the movement limits are loose.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::stats::{mean, std_dev};
use crate::trajectory::Trajectories;

/// Number of standard deviations beyond which an altitude is an outlier.
pub const ALTITUDE_SIGMA_THRESHOLD: f64 = 2.0;

/// Largest altitude change between consecutive observations, in kilometers.
pub const MAX_ALTITUDE_STEP_KM: f64 = 5.0;

/// Largest latitude or longitude change between consecutive observations,
/// in degrees.
pub const MAX_DEGREE_STEP: f64 = 15.0;

/// A flagged observation or observation pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnomalyRecord {
    /// A position whose altitude is far from the set's mean.
    AltitudeOutlier {
        /// The offending observation.
        position: Position,
        /// Mean altitude of the analyzed set.
        mean: f64,
        /// Population standard deviation of the analyzed set.
        std_dev: f64,
        /// Signed distance from the mean, in standard deviations.
        sigma: f64,
    },
    /// An abrupt change between two consecutive observations of one balloon.
    Movement {
        /// Balloon the observations belong to.
        balloon_id: usize,
        /// `hours_ago` of the older observation.
        from_hour: u32,
        /// `hours_ago` of the newer observation.
        to_hour: u32,
        /// Newer minus older altitude, km.
        altitude_change: f64,
        /// Newer minus older latitude, degrees.
        latitude_change: f64,
        /// Newer minus older longitude, degrees.
        longitude_change: f64,
    },
}

impl AnomalyRecord {
    /// Balloon the anomaly refers to.
    #[must_use]
    pub fn balloon_id(&self) -> usize {
        match self {
            Self::AltitudeOutlier { position, .. } => position.balloon_id,
            Self::Movement { balloon_id, .. } => *balloon_id,
        }
    }

    /// The hour used to order records of the same balloon.
    #[must_use]
    pub fn hour(&self) -> u32 {
        match self {
            Self::AltitudeOutlier { position, .. } => position.hours_ago,
            Self::Movement { to_hour, .. } => *to_hour,
        }
    }

    /// True for altitude outliers.
    #[must_use]
    pub fn is_altitude_outlier(&self) -> bool {
        matches!(self, Self::AltitudeOutlier { .. })
    }

    /// True for movement anomalies.
    #[must_use]
    pub fn is_movement(&self) -> bool {
        matches!(self, Self::Movement { .. })
    }
}

/// Flag altitude outliers in `positions` and movement anomalies in
/// `trajectories`.
///
/// The output order is unspecified; see [`AnomalyReport::sorted`].
#[must_use]
pub fn detect_anomalies(positions: &[Position], trajectories: &Trajectories) -> Vec<AnomalyRecord> {
    let mut records = altitude_outliers(positions);
    records.extend(movement_anomalies(trajectories));
    records
}

/// Positions whose altitude lies more than two standard deviations from the
/// mean. Empty or constant-altitude inputs yield nothing.
#[must_use]
pub fn altitude_outliers(positions: &[Position]) -> Vec<AnomalyRecord> {
    let altitudes: Vec<f64> = positions.iter().map(|p| p.altitude).collect();
    let Some(mu) = mean(&altitudes) else {
        return Vec::new();
    };
    let sigma = std_dev(&altitudes, mu).unwrap_or(0.0);
    if sigma <= 0.0 {
        return Vec::new();
    }

    positions
        .iter()
        .filter(|p| (p.altitude - mu).abs() > ALTITUDE_SIGMA_THRESHOLD * sigma)
        .map(|p| AnomalyRecord::AltitudeOutlier {
            position: p.clone(),
            mean: mu,
            std_dev: sigma,
            sigma: (p.altitude - mu) / sigma,
        })
        .collect()
}

/// Consecutive-observation jumps in every trajectory with at least two
/// positions.
#[must_use]
pub fn movement_anomalies(trajectories: &Trajectories) -> Vec<AnomalyRecord> {
    trajectories
        .values()
        .filter(|t| t.supports_movement())
        .flat_map(|t| t.steps())
        .filter_map(|(older, newer)| {
            let altitude_change = newer.altitude - older.altitude;
            let latitude_change = newer.latitude - older.latitude;
            let longitude_change = newer.longitude - older.longitude;

            let abrupt = altitude_change.abs() > MAX_ALTITUDE_STEP_KM
                || latitude_change.abs() > MAX_DEGREE_STEP
                || longitude_change.abs() > MAX_DEGREE_STEP;

            abrupt.then(|| AnomalyRecord::Movement {
                balloon_id: newer.balloon_id,
                from_hour: older.hours_ago,
                to_hour: newer.hours_ago,
                altitude_change,
                latitude_change,
                longitude_change,
            })
        })
        .collect()
}

/// Anomaly records with per-kind counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Number of altitude outliers.
    pub altitude_outliers: usize,
    /// Number of movement anomalies.
    pub movement_anomalies: usize,
    /// All records.
    pub records: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    /// Bundle records and count them by kind.
    #[must_use]
    pub fn new(records: Vec<AnomalyRecord>) -> Self {
        let altitude_outliers = records.iter().filter(|r| r.is_altitude_outlier()).count();
        Self {
            altitude_outliers,
            movement_anomalies: records.len() - altitude_outliers,
            records,
        }
    }

    /// Total number of records.
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Order records by balloon id, then hour, with outliers before
    /// movement records on ties.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.records.sort_by(|a, b| {
            a.balloon_id()
                .cmp(&b.balloon_id())
                .then(a.hour().cmp(&b.hour()))
                .then(a.is_movement().cmp(&b.is_movement()))
        });
        self
    }
}

impl fmt::Display for AnomalyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Altitude Anomalies:")?;
        writeln!(
            f,
            "{} balloons with unusual altitudes detected.",
            self.altitude_outliers
        )?;
        writeln!(f)?;
        writeln!(f, "Movement Anomalies:")?;
        write!(
            f,
            "{} instances of unusual movement patterns detected.",
            self.movement_anomalies
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Coordinates;
    use crate::trajectory::build_trajectories;
    use chrono::{TimeZone, Utc};

    fn pos(id: usize, hours_ago: u32, latitude: f64, longitude: f64, altitude: f64) -> Position {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Position::new(
            id,
            Coordinates {
                latitude,
                longitude,
                altitude,
            },
            hours_ago,
            at,
        )
    }

    fn at_altitudes(altitudes: &[f64]) -> Vec<Position> {
        altitudes
            .iter()
            .enumerate()
            .map(|(i, &alt)| pos(i, 0, 0.0, 0.0, alt))
            .collect()
    }

    #[test]
    fn test_altitude_outlier_flagged() {
        // mean 9.17, sigma 18.26, so 50 sits 2.24 sigma above the mean.
        let positions = at_altitudes(&[1.0, 1.0, 1.0, 1.0, 1.0, 50.0]);
        let records = altitude_outliers(&positions);

        assert_eq!(records.len(), 1);
        let AnomalyRecord::AltitudeOutlier {
            position, sigma, ..
        } = &records[0]
        else {
            panic!("expected an altitude outlier");
        };
        assert_eq!(position.altitude, 50.0);
        assert_eq!(position.balloon_id, 5);
        assert!(*sigma > 2.0);
    }

    #[test]
    fn test_altitude_outlier_below_mean() {
        let positions = at_altitudes(&[20.0, 20.0, 20.0, 20.0, 20.0, -30.0]);
        let records = altitude_outliers(&positions);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].balloon_id(), 5);
    }

    #[test]
    fn test_altitude_outliers_none_for_zero_variance() {
        assert!(altitude_outliers(&at_altitudes(&[12.0, 12.0, 12.0])).is_empty());
        assert!(altitude_outliers(&at_altitudes(&[12.0])).is_empty());
        assert!(altitude_outliers(&[]).is_empty());
    }

    #[test]
    fn test_altitude_outliers_none_within_two_sigma() {
        assert!(altitude_outliers(&at_altitudes(&[10.0, 11.0, 12.0, 13.0])).is_empty());
    }

    #[test]
    fn test_movement_latitude_jump_yields_one_record() {
        let positions = vec![pos(7, 0, 30.0, 10.0, 15.0), pos(7, 1, 10.0, 10.0, 15.0)];
        let records = movement_anomalies(&build_trajectories(&positions));

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            AnomalyRecord::Movement {
                balloon_id: 7,
                from_hour: 1,
                to_hour: 0,
                altitude_change: 0.0,
                latitude_change: 20.0,
                longitude_change: 0.0,
            }
        );
    }

    #[test]
    fn test_movement_altitude_and_longitude_jumps() {
        let positions = vec![
            pos(1, 2, 0.0, 0.0, 10.0),
            pos(1, 1, 0.0, 0.0, 16.0),
            pos(1, 0, 0.0, -16.0, 16.0),
        ];
        let records = movement_anomalies(&build_trajectories(&positions));

        assert_eq!(records.len(), 2);
        assert!(matches!(
            records[0],
            AnomalyRecord::Movement {
                from_hour: 2,
                to_hour: 1,
                ..
            }
        ));
        assert!(matches!(
            records[1],
            AnomalyRecord::Movement {
                from_hour: 1,
                to_hour: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_movement_thresholds_are_strict() {
        let positions = vec![pos(0, 1, 0.0, 0.0, 10.0), pos(0, 0, 15.0, 15.0, 15.0)];
        assert!(movement_anomalies(&build_trajectories(&positions)).is_empty());
    }

    #[test]
    fn test_movement_skips_gaps_between_fetched_hours() {
        // Hours 1 and 2 are missing; 3 -> 0 is still one adjacent pair.
        let positions = vec![pos(2, 3, 0.0, 0.0, 10.0), pos(2, 0, 0.0, 0.0, 20.0)];
        let records = movement_anomalies(&build_trajectories(&positions));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hour(), 0);
    }

    #[test]
    fn test_single_point_trajectory_excluded() {
        let positions = vec![pos(4, 0, 80.0, 170.0, 1.0)];
        assert!(movement_anomalies(&build_trajectories(&positions)).is_empty());
    }

    #[test]
    fn test_detect_anomalies_combines_both_kinds() {
        let mut positions = at_altitudes(&[1.0, 1.0, 1.0, 1.0, 1.0, 50.0]);
        positions.push(pos(0, 1, 20.0, 0.0, 1.0));
        let trajectories = build_trajectories(&positions);

        let report = AnomalyReport::new(detect_anomalies(&positions, &trajectories)).sorted();
        assert_eq!(report.movement_anomalies, 1);
        assert_eq!(report.altitude_outliers, 1);
        assert_eq!(report.total(), 2);
        assert_eq!(report.records[0].balloon_id(), 0);
        assert_eq!(report.records[1].balloon_id(), 5);
    }

    #[test]
    fn test_report_sorted_by_balloon_then_hour() {
        let positions = vec![
            pos(3, 2, 0.0, 0.0, 10.0),
            pos(3, 1, 20.0, 0.0, 10.0),
            pos(3, 0, 40.0, 0.0, 10.0),
            pos(1, 1, 0.0, 0.0, 10.0),
            pos(1, 0, 0.0, 0.0, 20.0),
        ];
        let trajectories = build_trajectories(&positions);
        let mut records = movement_anomalies(&trajectories);
        records.reverse();

        let report = AnomalyReport::new(records).sorted();
        let keys: Vec<(usize, u32)> = report
            .records
            .iter()
            .map(|r| (r.balloon_id(), r.hour()))
            .collect();
        assert_eq!(keys, vec![(1, 0), (3, 0), (3, 1)]);
    }

    #[test]
    fn test_report_text() {
        let report = AnomalyReport::default();
        let text = report.to_string();
        assert!(text.contains("0 balloons with unusual altitudes detected."));
        assert!(text.contains("0 instances of unusual movement patterns detected."));
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record = AnomalyRecord::Movement {
            balloon_id: 1,
            from_hour: 2,
            to_hour: 1,
            altitude_change: 6.0,
            latitude_change: 0.0,
            longitude_change: 0.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "movement");
        assert_eq!(json["from_hour"], 2);
    }
}
