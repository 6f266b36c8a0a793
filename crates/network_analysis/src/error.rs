// ---------------------------------------------------------------------------
// AnalysisError: typed failures for every analysis stage
// ---------------------------------------------------------------------------

use std::fmt;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::road_network::{JunctionId, SegmentId};

/// What exactly is wrong with a network description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum NetworkDefect {
    /// A segment endpoint names a junction that does not exist.
    DanglingJunction {
        segment: SegmentId,
        junction: JunctionId,
    },
    /// A segment polyline has fewer than two points.
    DegeneratePolyline { segment: SegmentId, points: u32 },
    /// A segment polyline contains NaN or infinite coordinates.
    NonFiniteGeometry { segment: SegmentId },
    /// Two segments share the same id.
    DuplicateSegment(SegmentId),
    /// Two junctions share the same id.
    DuplicateJunction(JunctionId),
}

impl fmt::Display for NetworkDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkDefect::DanglingJunction { segment, junction } => write!(
                f,
                "segment {} references missing junction {}",
                segment.0, junction.0
            ),
            NetworkDefect::DegeneratePolyline { segment, points } => write!(
                f,
                "segment {} has a degenerate polyline ({points} point(s), need at least 2)",
                segment.0
            ),
            NetworkDefect::NonFiniteGeometry { segment } => {
                write!(f, "segment {} has non-finite coordinates", segment.0)
            }
            NetworkDefect::DuplicateSegment(id) => write!(f, "duplicate segment id {}", id.0),
            NetworkDefect::DuplicateJunction(id) => write!(f, "duplicate junction id {}", id.0),
        }
    }
}

/// Errors that can occur while building or analyzing a road network.
///
/// `MalformedNetwork` aborts the whole analysis of that network.
/// `InvalidSegment` only aborts the capacity computation of one segment;
/// the estimator collects these and continues with the siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum AnalysisError {
    /// The network graph is not usable (dangling references, bad geometry).
    MalformedNetwork(NetworkDefect),
    /// A segment width is zero, negative or not a number.
    InvalidSegment { segment: SegmentId, width: f32 },
    /// Vehicle percentages that cannot be normalized.
    InvalidComposition(String),
    /// A configuration value outside its domain, or unparsable JSON.
    InvalidConfig(String),
    /// The requested city profile is not in the catalog.
    UnknownCity(String),
    /// The unit of work was cancelled before it completed.
    Cancelled,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MalformedNetwork(defect) => write!(f, "Malformed network: {defect}"),
            AnalysisError::InvalidSegment { segment, width } => write!(
                f,
                "Invalid segment {}: width must be positive, got {width}",
                segment.0
            ),
            AnalysisError::InvalidComposition(msg) => write!(f, "Invalid composition: {msg}"),
            AnalysisError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            AnalysisError::UnknownCity(name) => write!(f, "Unknown city profile: {name}"),
            AnalysisError::Cancelled => write!(f, "Analysis cancelled"),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<NetworkDefect> for AnalysisError {
    fn from(defect: NetworkDefect) -> Self {
        AnalysisError::MalformedNetwork(defect)
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_malformed_dangling() {
        let err = AnalysisError::MalformedNetwork(NetworkDefect::DanglingJunction {
            segment: SegmentId(4),
            junction: JunctionId(9),
        });
        let msg = format!("{err}");
        assert!(msg.contains("Malformed network"), "got: {msg}");
        assert!(msg.contains("segment 4"), "got: {msg}");
        assert!(msg.contains("junction 9"), "got: {msg}");
    }

    #[test]
    fn test_display_invalid_segment() {
        let err = AnalysisError::InvalidSegment {
            segment: SegmentId(2),
            width: -1.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("segment 2"), "got: {msg}");
        assert!(msg.contains("-1.5"), "got: {msg}");
    }

    #[test]
    fn test_from_defect() {
        let err: AnalysisError = NetworkDefect::DuplicateSegment(SegmentId(1)).into();
        assert!(matches!(
            err,
            AnalysisError::MalformedNetwork(NetworkDefect::DuplicateSegment(_))
        ));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AnalysisError = json_err.into();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn test_is_error_trait() {
        let err = AnalysisError::Cancelled;
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(format!("{err}"), "Analysis cancelled");
    }
}
