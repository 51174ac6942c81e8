//! JSON payloads handed to collaborators (map front-end, narrators).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::anomaly::AnomalyReport;
use crate::position::Position;
use crate::stats::Summary;
use crate::trajectory::{Trajectories, Trajectory};

/// Positions of one snapshot, stamped with the response time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    /// When the response was built.
    pub timestamp: DateTime<Utc>,
    /// The validated positions.
    pub balloons: Vec<Position>,
}

/// One point of a map trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Altitude, km.
    pub alt: f64,
    /// Observation time.
    pub time: DateTime<Utc>,
}

/// A trajectory shaped for map rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryView {
    /// Balloon id.
    pub id: usize,
    /// Points, most recent first.
    pub points: Vec<TrajectoryPoint>,
    /// Stable `#rrggbb` color for the balloon.
    pub color: String,
}

impl From<&Trajectory> for TrajectoryView {
    fn from(trajectory: &Trajectory) -> Self {
        let id = trajectory.balloon_id();
        Self {
            id,
            points: trajectory
                .positions()
                .iter()
                .map(|p| TrajectoryPoint {
                    lat: p.latitude,
                    lng: p.longitude,
                    alt: p.altitude,
                    time: p.timestamp,
                })
                .collect(),
            color: balloon_color(id),
        }
    }
}

/// Map views for every trajectory with more than one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryResponse {
    /// When the response was built.
    pub timestamp: DateTime<Utc>,
    /// Drawable trajectories.
    pub trajectories: Vec<TrajectoryView>,
}

impl TrajectoryResponse {
    /// Build views for all drawable trajectories.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, trajectories: &Trajectories) -> Self {
        Self {
            timestamp,
            trajectories: trajectories
                .values()
                .filter(|t| t.len() > 1)
                .map(TrajectoryView::from)
                .collect(),
        }
    }
}

/// Summary and anomalies of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// When the response was built.
    pub timestamp: DateTime<Utc>,
    /// Descriptive statistics.
    pub summary: Summary,
    /// Flagged anomalies.
    pub anomalies: AnomalyReport,
}

impl AnalysisResponse {
    /// Build a response from an analysis.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, analysis: &Analysis) -> Self {
        Self {
            timestamp,
            summary: analysis.summary.clone(),
            anomalies: analysis.anomalies.clone(),
        }
    }
}

/// Stable display color for a balloon id.
#[must_use]
pub fn balloon_color(balloon_id: usize) -> String {
    let hash = blake3::hash(balloon_id.to_string().as_bytes());
    let hex = hash.to_hex();
    format!("#{}", &hex.as_str()[..6])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Coordinates;
    use crate::trajectory::build_trajectories;
    use chrono::TimeZone;

    fn pos(id: usize, hours_ago: u32) -> Position {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Position::new(
            id,
            Coordinates {
                latitude: 1.0,
                longitude: 2.0,
                altitude: 3.0,
            },
            hours_ago,
            at,
        )
    }

    #[test]
    fn test_balloon_color_is_stable_hex() {
        let a = balloon_color(42);
        assert_eq!(a, balloon_color(42));
        assert_eq!(a.len(), 7);
        assert!(a.starts_with('#'));
        assert!(a[1..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(balloon_color(1), balloon_color(2));
    }

    #[test]
    fn test_trajectory_response_skips_single_points() {
        let trajectories = build_trajectories(&[pos(0, 0), pos(0, 1), pos(1, 0)]);
        let response = TrajectoryResponse::new(Utc::now(), &trajectories);

        assert_eq!(response.trajectories.len(), 1);
        let view = &response.trajectories[0];
        assert_eq!(view.id, 0);
        assert_eq!(view.points.len(), 2);
        assert_eq!(view.color, balloon_color(0));
    }

    #[test]
    fn test_trajectory_point_field_names() {
        let trajectories = build_trajectories(&[pos(0, 0), pos(0, 1)]);
        let view = TrajectoryView::from(&trajectories[&0]);
        let json = serde_json::to_value(&view).unwrap();

        let point = &json["points"][0];
        assert_eq!(point["lat"], 1.0);
        assert_eq!(point["lng"], 2.0);
        assert_eq!(point["alt"], 3.0);
        assert_eq!(point["time"], "2025-03-01T12:00:00Z");
    }

    #[test]
    fn test_snapshot_response_shape() {
        let response = SnapshotResponse {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            balloons: vec![pos(0, 0)],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["balloons"][0]["balloon_id"], 0);
        assert_eq!(json["timestamp"], "2025-03-01T12:00:00Z");
    }

    #[test]
    fn test_analysis_response_from_analysis() {
        let analysis = Analysis::from_positions(vec![pos(0, 0), pos(0, 1)]);
        let response = AnalysisResponse::new(Utc::now(), &analysis);

        assert_eq!(response.summary, analysis.summary);
        assert_eq!(response.anomalies.total(), 0);
    }
}
