//! One pass of the ingestion → reconstruction → detection pipeline.
//!
//! An [`Analysis`] is computed from scratch from a freshly fetched position
//! set and is discarded afterwards. Nothing is cached between analyses.

use tracing::info;

use crate::anomaly::{detect_anomalies, AnomalyReport};
use crate::clock::Clock;
use crate::fetcher::SnapshotFetcher;
use crate::position::Position;
use crate::source::SnapshotSource;
use crate::stats::{summarize, Summary};
use crate::trajectory::{build_trajectories, Trajectories};

/// Derived views over one position set.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The combined positions the analysis was computed from.
    pub positions: Vec<Position>,
    /// Per-balloon trajectories.
    pub trajectories: Trajectories,
    /// Descriptive statistics.
    pub summary: Summary,
    /// Flagged anomalies, sorted by balloon then hour.
    pub anomalies: AnomalyReport,
}

impl Analysis {
    /// Run trajectory reconstruction, summarization, and anomaly detection
    /// over `positions`.
    #[must_use]
    pub fn from_positions(positions: Vec<Position>) -> Self {
        let trajectories = build_trajectories(&positions);
        let summary = summarize(&positions);
        let anomalies = AnomalyReport::new(detect_anomalies(&positions, &trajectories)).sorted();

        info!(
            positions = positions.len(),
            balloons = trajectories.len(),
            altitude_outliers = anomalies.altitude_outliers,
            movement_anomalies = anomalies.movement_anomalies,
            "Analysis complete"
        );

        Self {
            positions,
            trajectories,
            summary,
            anomalies,
        }
    }

    /// Fetch the last `hours` snapshots and analyze them.
    #[must_use]
    pub fn fetch<S: SnapshotSource, C: Clock>(fetcher: &SnapshotFetcher<S, C>, hours: u32) -> Self {
        Self::from_positions(fetcher.fetch_historical_data(hours))
    }

    /// True when no positions survived ingestion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Text summary of the data for a narrator.
    #[must_use]
    pub fn data_summary(&self) -> String {
        self.summary.to_string()
    }

    /// Text summary of the anomaly counts for a narrator.
    #[must_use]
    pub fn anomaly_summary(&self) -> String {
        self.anomalies.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::source::MemorySource;
    use chrono::{TimeZone, Utc};

    fn fetcher(source: MemorySource) -> SnapshotFetcher<MemorySource, FixedClock> {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        SnapshotFetcher::with_clock(source, FixedClock(at))
    }

    #[test]
    fn test_analysis_of_empty_feed() {
        let analysis = Analysis::fetch(&fetcher(MemorySource::new()), 24);

        assert!(analysis.is_empty());
        assert!(analysis.trajectories.is_empty());
        assert_eq!(analysis.summary, Summary::NoData);
        assert_eq!(analysis.anomalies.total(), 0);
        assert_eq!(analysis.data_summary(), "No data available.");
    }

    #[test]
    fn test_analysis_links_components() {
        let source = MemorySource::new()
            .with_body(0, "[null, [40, 10, 15], [5, 5, 15]]")
            .with_body(1, "[null, [20, 10, 15], [5, 6, 15]]");
        let analysis = Analysis::fetch(&fetcher(source), 2);

        assert_eq!(analysis.positions.len(), 4);
        assert_eq!(analysis.trajectories.len(), 2);
        assert_eq!(analysis.anomalies.movement_anomalies, 1);
        assert_eq!(analysis.anomalies.records[0].balloon_id(), 0);
        assert!(analysis.data_summary().contains("Total unique balloons tracked: 2"));
        assert!(analysis
            .anomaly_summary()
            .contains("1 instances of unusual movement patterns detected."));
    }
}
