//! Per-entry snapshot validation.
//!
//! Every raw entry either becomes [`Coordinates`] or is rejected with a
//! [`Rejection`] that says why. Rejections are logged and counted, never
//! raised, so a single bad entry cannot abort the rest of the snapshot.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info};

use crate::position::{in_bounds, Coordinates};

/// Why a raw entry was discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The entry was null or empty.
    Blank,
    /// The entry was not an array.
    NotATriple,
    /// The entry was an array of the wrong length.
    WrongArity {
        /// Number of elements found.
        len: usize,
    },
    /// A component was not a number.
    NonNumeric {
        /// Which component: `latitude`, `longitude` or `altitude`.
        component: &'static str,
    },
    /// Latitude outside `[-90, 90]` or longitude outside `[-180, 180]`.
    OutOfRange {
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => write!(f, "blank entry"),
            Self::NotATriple => write!(f, "entry is not an array"),
            Self::WrongArity { len } => write!(f, "expected 3 components, found {len}"),
            Self::NonNumeric { component } => write!(f, "{component} is not numeric"),
            Self::OutOfRange {
                latitude,
                longitude,
            } => write!(f, "coordinates out of range ({latitude}, {longitude})"),
        }
    }
}

/// Outcome of validating a whole snapshot body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Accepted entries, keyed by their index after the placeholder drop.
    pub accepted: Vec<(usize, Coordinates)>,
    /// Rejected entries with the reason they were discarded.
    pub rejected: Vec<(usize, Rejection)>,
    /// Whether a leading placeholder was dropped before indexing.
    pub dropped_placeholder: bool,
}

impl ValidationReport {
    /// Number of entries inspected (excluding the dropped placeholder).
    #[must_use]
    pub fn inspected(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

const COMPONENTS: [&str; 3] = ["latitude", "longitude", "altitude"];

/// Validate a single raw entry.
///
/// # Errors
///
/// Returns the [`Rejection`] describing why the entry is unusable.
pub fn validate_entry(entry: &Value) -> Result<Coordinates, Rejection> {
    if is_blank(entry) {
        return Err(Rejection::Blank);
    }
    let Value::Array(items) = entry else {
        return Err(Rejection::NotATriple);
    };
    if items.len() != 3 {
        return Err(Rejection::WrongArity { len: items.len() });
    }

    let mut parts = [0.0_f64; 3];
    for (slot, (item, component)) in parts.iter_mut().zip(items.iter().zip(COMPONENTS)) {
        *slot = item
            .as_f64()
            .ok_or(Rejection::NonNumeric { component })?;
    }
    let [latitude, longitude, altitude] = parts;

    if !in_bounds(latitude, longitude) {
        return Err(Rejection::OutOfRange {
            latitude,
            longitude,
        });
    }

    Ok(Coordinates {
        latitude,
        longitude,
        altitude,
    })
}

/// Validate every entry of a snapshot array.
///
/// A blank first element is a formatting artifact of the feed and is removed
/// before indexing, so `balloon_id` 0 is the first real entry.
#[must_use]
pub fn validate_entries(entries: &[Value]) -> ValidationReport {
    let dropped_placeholder = entries.first().is_some_and(is_blank);
    let entries = if dropped_placeholder {
        &entries[1..]
    } else {
        entries
    };

    let mut report = ValidationReport {
        dropped_placeholder,
        ..ValidationReport::default()
    };

    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry) {
            Ok(coords) => report.accepted.push((index, coords)),
            Err(reason) => {
                debug!(index, %reason, "Snapshot entry rejected");
                report.rejected.push((index, reason));
            }
        }
    }

    if !report.rejected.is_empty() {
        info!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "Snapshot contained invalid entries"
        );
    }

    report
}

/// Null, `false`, zero, and empty strings/arrays/objects count as blank.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_entry_accepts_numeric_triple() {
        let coords = validate_entry(&json!([10, 20.5, 5])).unwrap();
        assert_eq!(coords.latitude, 10.0);
        assert_eq!(coords.longitude, 20.5);
        assert_eq!(coords.altitude, 5.0);
    }

    #[test]
    fn test_validate_entry_rejections() {
        assert_eq!(validate_entry(&json!(null)), Err(Rejection::Blank));
        assert_eq!(validate_entry(&json!([])), Err(Rejection::Blank));
        assert_eq!(validate_entry(&json!("x")), Err(Rejection::NotATriple));
        assert_eq!(
            validate_entry(&json!([1, 2])),
            Err(Rejection::WrongArity { len: 2 })
        );
        assert_eq!(
            validate_entry(&json!([1, 2, 3, 4])),
            Err(Rejection::WrongArity { len: 4 })
        );
        assert_eq!(
            validate_entry(&json!([30, "bad", 5])),
            Err(Rejection::NonNumeric {
                component: "longitude"
            })
        );
        assert_eq!(
            validate_entry(&json!([30, 5, null])),
            Err(Rejection::NonNumeric {
                component: "altitude"
            })
        );
        assert!(matches!(
            validate_entry(&json!([200, 20, 5])),
            Err(Rejection::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_entry(&json!([0, -181, 5])),
            Err(Rejection::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_entry_keeps_negative_altitude() {
        let coords = validate_entry(&json!([0, 0, -0.2])).unwrap();
        assert_eq!(coords.altitude, -0.2);
    }

    #[test]
    fn test_validate_entries_drops_leading_placeholder_and_bad_entries() {
        let raw = json!([null, [10, 20, 5], [200, 20, 5], [30, "bad", 5]]);
        let report = validate_entries(raw.as_array().unwrap());

        assert!(report.dropped_placeholder);
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.accepted[0].0, 0);
        assert_eq!(report.accepted[0].1.latitude, 10.0);
        assert_eq!(report.accepted[0].1.longitude, 20.0);
        assert_eq!(report.accepted[0].1.altitude, 5.0);
        assert_eq!(report.rejected.len(), 2);
        assert!(matches!(report.rejected[0], (1, Rejection::OutOfRange { .. })));
        assert_eq!(
            report.rejected[1],
            (
                2,
                Rejection::NonNumeric {
                    component: "longitude"
                }
            )
        );
        assert_eq!(report.inspected(), 3);
    }

    #[test]
    fn test_validate_entries_without_placeholder_keeps_first_index() {
        let raw = json!([[1, 1, 1], [2, 2, 2]]);
        let report = validate_entries(raw.as_array().unwrap());

        assert!(!report.dropped_placeholder);
        let ids: Vec<usize> = report.accepted.iter().map(|(i, _)| *i).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_validate_entries_only_first_blank_is_a_placeholder() {
        let raw = json!([[], [1, 1, 1], null, [2, 2, 2]]);
        let report = validate_entries(raw.as_array().unwrap());

        let ids: Vec<usize> = report.accepted.iter().map(|(i, _)| *i).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(report.rejected, vec![(1, Rejection::Blank)]);
    }

    #[test]
    fn test_validate_entries_empty() {
        let report = validate_entries(&[]);
        assert!(!report.dropped_placeholder);
        assert_eq!(report.inspected(), 0);
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(Rejection::Blank.to_string(), "blank entry");
        assert_eq!(
            Rejection::WrongArity { len: 2 }.to_string(),
            "expected 3 components, found 2"
        );
        assert_eq!(
            Rejection::NonNumeric {
                component: "latitude"
            }
            .to_string(),
            "latitude is not numeric"
        );
    }
}
