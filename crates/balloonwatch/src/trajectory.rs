//! Cross-hour trajectory reconstruction.
//!
//! Positions are grouped by `balloon_id` and ordered by ascending
//! `hours_ago`, so index 0 of a trajectory is its most recent observation.
//! No length filter is applied here; movement analyses skip trajectories
//! shorter than [`MIN_MOVEMENT_POINTS`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::position::Position;

/// Minimum number of positions a trajectory needs for movement analysis.
pub const MIN_MOVEMENT_POINTS: usize = 2;

/// The ordered history of one balloon, most recent first.
///
/// Never empty and never mixes balloons; deserialization enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Position>", try_from = "Vec<Position>")]
pub struct Trajectory {
    positions: Vec<Position>,
}

impl Trajectory {
    /// Balloon this trajectory belongs to.
    #[must_use]
    pub fn balloon_id(&self) -> usize {
        self.positions[0].balloon_id
    }

    /// Positions, most recent first.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; a trajectory holds at least one position.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Whether this trajectory has enough points for movement analysis.
    #[must_use]
    pub fn supports_movement(&self) -> bool {
        self.positions.len() >= MIN_MOVEMENT_POINTS
    }

    /// The observation with the smallest `hours_ago`.
    #[must_use]
    pub fn newest(&self) -> &Position {
        &self.positions[0]
    }

    /// The observation with the largest `hours_ago`.
    #[must_use]
    pub fn oldest(&self) -> &Position {
        &self.positions[self.positions.len() - 1]
    }

    /// Temporally adjacent pairs `(older, newer)`, walked oldest to newest.
    ///
    /// Adjacent means consecutive among the fetched hours; hours with no
    /// observation for this balloon are simply absent.
    pub fn steps(&self) -> impl Iterator<Item = (&Position, &Position)> + '_ {
        self.positions
            .windows(2)
            .rev()
            .map(|pair| (&pair[1], &pair[0]))
    }
}

impl From<Trajectory> for Vec<Position> {
    fn from(trajectory: Trajectory) -> Self {
        trajectory.positions
    }
}

impl TryFrom<Vec<Position>> for Trajectory {
    type Error = Error;

    fn try_from(mut positions: Vec<Position>) -> Result<Self, Self::Error> {
        let Some(first) = positions.first() else {
            return Err(Error::InvalidTrajectory {
                message: "no positions".to_string(),
            });
        };
        let id = first.balloon_id;
        if let Some(stray) = positions.iter().find(|p| p.balloon_id != id) {
            return Err(Error::InvalidTrajectory {
                message: format!(
                    "positions of balloons {id} and {} cannot share a trajectory",
                    stray.balloon_id
                ),
            });
        }
        positions.sort_by(chronological);
        Ok(Self { positions })
    }
}

/// All trajectories of an analysis, keyed by balloon id.
pub type Trajectories = BTreeMap<usize, Trajectory>;

/// Group positions by balloon and order each group by ascending `hours_ago`.
///
/// The result does not depend on input order: ties on `hours_ago` are broken
/// by the coordinates themselves.
#[must_use]
pub fn build_trajectories(positions: &[Position]) -> Trajectories {
    let mut groups: BTreeMap<usize, Vec<Position>> = BTreeMap::new();
    for pos in positions {
        groups.entry(pos.balloon_id).or_default().push(pos.clone());
    }

    groups
        .into_iter()
        .map(|(id, mut group)| {
            group.sort_by(chronological);
            (id, Trajectory { positions: group })
        })
        .collect()
}

fn chronological(a: &Position, b: &Position) -> Ordering {
    a.hours_ago
        .cmp(&b.hours_ago)
        .then_with(|| a.latitude.total_cmp(&b.latitude))
        .then_with(|| a.longitude.total_cmp(&b.longitude))
        .then_with(|| a.altitude.total_cmp(&b.altitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Coordinates;
    use chrono::{TimeZone, Utc};

    fn pos(id: usize, hours_ago: u32, lat: f64) -> Position {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Position::new(
            id,
            Coordinates {
                latitude: lat,
                longitude: 0.0,
                altitude: 10.0,
            },
            hours_ago,
            at,
        )
    }

    #[test]
    fn test_build_trajectories_groups_and_orders() {
        let positions = vec![pos(3, 1, 11.0), pos(3, 0, 10.0)];
        let trajectories = build_trajectories(&positions);

        assert_eq!(trajectories.len(), 1);
        let t = &trajectories[&3];
        assert_eq!(t.balloon_id(), 3);
        let hours: Vec<u32> = t.positions().iter().map(|p| p.hours_ago).collect();
        assert_eq!(hours, vec![0, 1]);
        assert_eq!(t.newest().hours_ago, 0);
        assert_eq!(t.oldest().hours_ago, 1);
    }

    #[test]
    fn test_build_trajectories_keeps_single_point_groups() {
        let positions = vec![pos(1, 0, 1.0), pos(2, 0, 2.0), pos(2, 5, 2.5)];
        let trajectories = build_trajectories(&positions);

        assert_eq!(trajectories.len(), 2);
        assert!(!trajectories[&1].supports_movement());
        assert!(trajectories[&2].supports_movement());
    }

    #[test]
    fn test_build_trajectories_is_order_independent() {
        let mut positions = vec![
            pos(1, 2, 1.0),
            pos(0, 0, 5.0),
            pos(1, 0, 3.0),
            pos(1, 2, 0.5),
            pos(0, 1, 4.0),
        ];
        let forward = build_trajectories(&positions);
        positions.reverse();
        let backward = build_trajectories(&positions);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_steps_walk_oldest_to_newest() {
        let positions = vec![pos(0, 0, 0.0), pos(0, 3, 3.0), pos(0, 1, 1.0)];
        let trajectories = build_trajectories(&positions);

        let steps: Vec<(u32, u32)> = trajectories[&0]
            .steps()
            .map(|(older, newer)| (older.hours_ago, newer.hours_ago))
            .collect();
        assert_eq!(steps, vec![(3, 1), (1, 0)]);
    }

    #[test]
    fn test_steps_empty_for_single_point() {
        let trajectories = build_trajectories(&[pos(9, 4, 0.0)]);
        assert_eq!(trajectories[&9].steps().count(), 0);
    }

    #[test]
    fn test_build_trajectories_empty() {
        assert!(build_trajectories(&[]).is_empty());
    }

    #[test]
    fn test_trajectory_serializes_as_position_list() {
        let trajectories = build_trajectories(&[pos(3, 0, 1.0), pos(3, 1, 2.0)]);
        let json = serde_json::to_value(&trajectories).unwrap();

        let list = json["3"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["hours_ago"], 0);
        assert_eq!(list[1]["hours_ago"], 1);
    }

    #[test]
    fn test_trajectory_deserializes_in_order() {
        let json = serde_json::to_string(&vec![pos(5, 2, 3.0), pos(5, 0, 1.0)]).unwrap();
        let trajectory: Trajectory = serde_json::from_str(&json).unwrap();

        assert_eq!(trajectory.balloon_id(), 5);
        assert_eq!(trajectory.newest().hours_ago, 0);
        assert_eq!(trajectory.oldest().hours_ago, 2);
    }

    #[test]
    fn test_empty_trajectory_is_rejected() {
        let err = serde_json::from_str::<Trajectories>(r#"{"7": []}"#).unwrap_err();
        assert!(err.to_string().contains("no positions"));

        let err = Trajectory::try_from(Vec::new()).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_mixed_balloons_are_rejected() {
        let err = Trajectory::try_from(vec![pos(1, 0, 1.0), pos(2, 1, 2.0)]).unwrap_err();
        assert!(matches!(err, Error::InvalidTrajectory { .. }));
    }
}
