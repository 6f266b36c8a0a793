//! Mixed-traffic capacity estimation per segment.
//!
//! ## Capacity model
//!
//! `base = base_rate * (width / lane_width)`
//! `adjusted = base * mixed_traffic_factor * encroachment_factor`
//!
//! ### Width bands (defaults)
//!
//! | Width        | Base rate (veh/h/lane) | Mixed-traffic factor |
//! |--------------|------------------------|----------------------|
//! | >= 14 m      | 1800                   | 0.7                  |
//! | >= 10 m      | 1500                   | 0.6                  |
//! | >= 7 m       | 1200                   | 0.5                  |
//! | otherwise    | 800                    | 0.4                  |
//!
//! The bands are finer than the four road classes and keyed by width, not by
//! class. The mixed-traffic factor models heterogeneous vehicles sharing lane
//! space without lane discipline; the encroachment factor (default 0.8) models
//! carriageway lost to parking, vending and obstructions. Both are
//! configuration inputs and validated to lie in `[0, 1]`, so the adjusted
//! capacity never exceeds the base capacity.

use bevy::log::warn;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::road_class::{classify, RoadClass};
use crate::road_network::{RoadNetwork, Segment, SegmentId};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Lower width bound and per-lane base rate of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityBand {
    /// Inclusive lower bound in meters. Ignored for the last (catch-all) band.
    pub min_width: f32,
    /// Vehicles per hour per reference lane.
    pub base_rate: f32,
}

/// Width-band capacity parameters, widest band first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapacityParams {
    /// Reference lane width in meters.
    pub lane_width: f32,
    pub bands: [CapacityBand; 4],
}

impl Default for CapacityParams {
    fn default() -> Self {
        Self {
            lane_width: 3.5,
            bands: [
                CapacityBand {
                    min_width: 14.0,
                    base_rate: 1800.0,
                },
                CapacityBand {
                    min_width: 10.0,
                    base_rate: 1500.0,
                },
                CapacityBand {
                    min_width: 7.0,
                    base_rate: 1200.0,
                },
                CapacityBand {
                    min_width: 0.0,
                    base_rate: 800.0,
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Capacity of one segment. Produced once per analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CapacityRecord {
    pub segment: SegmentId,
    pub road_class: RoadClass,
    /// Vehicles per hour before derating.
    pub base_capacity: f32,
    pub mixed_traffic_factor: f32,
    pub encroachment_factor: f32,
    /// Vehicles per hour after mixed-traffic and encroachment derating.
    pub adjusted_capacity: f32,
}

/// Capacities of a whole network, plus the segments that could not be
/// estimated. A bad segment never hides its siblings' results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CapacityTable {
    pub records: Vec<CapacityRecord>,
    pub errors: Vec<AnalysisError>,
}

impl CapacityTable {
    pub fn get(&self, segment: SegmentId) -> Option<&CapacityRecord> {
        self.records.iter().find(|r| r.segment == segment)
    }

    pub fn total_adjusted(&self) -> f32 {
        self.records.iter().map(|r| r.adjusted_capacity).sum()
    }

    /// Mean adjusted capacity, `None` when nothing could be estimated.
    pub fn mean_adjusted(&self) -> Option<f32> {
        if self.records.is_empty() {
            return None;
        }
        Some(self.total_adjusted() / self.records.len() as f32)
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Band {
    min_width: f32,
    base_rate: f32,
    mixed_traffic_factor: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacityEstimator {
    lane_width: f32,
    bands: [Band; 4],
    encroachment_factor: f32,
}

impl Default for CapacityEstimator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl CapacityEstimator {
    /// Factors are clamped to `[0, 1]`, so an unvalidated configuration can
    /// still never raise a segment above its base capacity.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let params = &config.capacity;
        let bands = std::array::from_fn(|i| Band {
            min_width: params.bands[i].min_width,
            base_rate: params.bands[i].base_rate,
            mixed_traffic_factor: config.mixed_traffic_factors[i].clamp(0.0, 1.0),
        });
        Self {
            lane_width: params.lane_width,
            bands,
            encroachment_factor: config.encroachment_factor.clamp(0.0, 1.0),
        }
    }

    fn band_for(&self, width: f32) -> &Band {
        self.bands[..3]
            .iter()
            .find(|b| width >= b.min_width)
            .unwrap_or(&self.bands[3])
    }

    /// Estimate one segment. Fails with `InvalidSegment` for a width that is
    /// not strictly positive.
    pub fn estimate(&self, segment: &Segment) -> Result<CapacityRecord, AnalysisError> {
        let width = segment.width;
        if !(width > 0.0) || !width.is_finite() {
            return Err(AnalysisError::InvalidSegment {
                segment: segment.id,
                width,
            });
        }

        let band = self.band_for(width);
        let base_capacity = (band.base_rate * (width / self.lane_width)).max(0.0);
        let adjusted_capacity =
            (base_capacity * band.mixed_traffic_factor * self.encroachment_factor).max(0.0);

        Ok(CapacityRecord {
            segment: segment.id,
            road_class: classify(segment),
            base_capacity,
            mixed_traffic_factor: band.mixed_traffic_factor,
            encroachment_factor: self.encroachment_factor,
            adjusted_capacity,
        })
    }

    /// Estimate every segment, collecting per-segment failures.
    pub fn estimate_network(&self, network: &RoadNetwork) -> CapacityTable {
        let mut table = CapacityTable::default();
        for segment in network.segments() {
            match self.estimate(segment) {
                Ok(record) => table.records.push(record),
                Err(e) => {
                    warn!("Skipping capacity for segment {}: {}", segment.id.0, e);
                    table.errors.push(e);
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec2;

    use super::*;
    use crate::fixtures;
    use crate::road_network::Junction;

    fn segment(width: f32) -> Segment {
        Segment::straight(1, 0, 1, width, Vec2::ZERO, Vec2::new(100.0, 0.0), 0.0)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-2
    }

    #[test]
    fn test_band_rates() {
        let est = CapacityEstimator::default();

        let r = est.estimate(&segment(14.0)).unwrap();
        assert!(approx(r.base_capacity, 1800.0 * 4.0));
        assert!(approx(r.adjusted_capacity, 1800.0 * 4.0 * 0.7 * 0.8));
        assert_eq!(r.road_class, RoadClass::Highway);

        let r = est.estimate(&segment(10.5)).unwrap();
        assert!(approx(r.base_capacity, 1500.0 * 3.0));
        assert!(approx(r.adjusted_capacity, 1500.0 * 3.0 * 0.6 * 0.8));

        let r = est.estimate(&segment(7.0)).unwrap();
        assert!(approx(r.base_capacity, 1200.0 * 2.0));
        assert!(approx(r.adjusted_capacity, 1200.0 * 2.0 * 0.5 * 0.8));

        let r = est.estimate(&segment(3.5)).unwrap();
        assert!(approx(r.base_capacity, 800.0));
        assert!(approx(r.adjusted_capacity, 800.0 * 0.4 * 0.8));
        assert_eq!(r.road_class, RoadClass::Local);
    }

    #[test]
    fn test_band_edges() {
        let est = CapacityEstimator::default();
        assert!(approx(est.estimate(&segment(13.99)).unwrap().mixed_traffic_factor, 0.6));
        assert!(approx(est.estimate(&segment(9.99)).unwrap().mixed_traffic_factor, 0.5));
        assert!(approx(est.estimate(&segment(6.99)).unwrap().mixed_traffic_factor, 0.4));
    }

    #[test]
    fn test_adjusted_never_exceeds_base() {
        let est = CapacityEstimator::default();
        let mut w = 0.25_f32;
        while w < 40.0 {
            let r = est.estimate(&segment(w)).unwrap();
            assert!(r.adjusted_capacity <= r.base_capacity, "width {w}");
            assert!(r.adjusted_capacity >= 0.0, "width {w}");
            w += 0.25;
        }
    }

    #[test]
    fn test_factors_overridable() {
        let config = AnalysisConfig {
            encroachment_factor: 1.0,
            mixed_traffic_factors: [1.0, 1.0, 1.0, 1.0],
            ..Default::default()
        };
        let est = CapacityEstimator::from_config(&config);
        let r = est.estimate(&segment(7.0)).unwrap();
        assert!(approx(r.adjusted_capacity, r.base_capacity));

        let config = AnalysisConfig {
            encroachment_factor: 0.5,
            ..Default::default()
        };
        let r = CapacityEstimator::from_config(&config)
            .estimate(&segment(7.0))
            .unwrap();
        assert!(approx(r.adjusted_capacity, 2400.0 * 0.5 * 0.5));
    }

    #[test]
    fn test_factors_above_one_are_clamped() {
        let config = AnalysisConfig {
            encroachment_factor: 1.5,
            mixed_traffic_factors: [1.0; 4],
            ..Default::default()
        };
        let r = CapacityEstimator::from_config(&config)
            .estimate(&segment(7.0))
            .unwrap();
        assert!(
            r.adjusted_capacity <= r.base_capacity,
            "adjusted {} > base {}",
            r.adjusted_capacity,
            r.base_capacity
        );
        assert_eq!(r.encroachment_factor, 1.0);
    }

    #[test]
    fn test_non_positive_width_fails() {
        let est = CapacityEstimator::default();
        for w in [0.0, -3.0, f32::NAN] {
            let err = est.estimate(&segment(w)).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidSegment { .. }), "width {w}");
        }
    }

    #[test]
    fn test_network_collects_and_continues() {
        let junctions = vec![
            Junction::new(0, 0.0, 0.0),
            Junction::new(1, 100.0, 0.0),
            Junction::new(2, 200.0, 0.0),
        ];
        let segments = vec![
            Segment::straight(1, 0, 1, 7.0, Vec2::ZERO, Vec2::new(100.0, 0.0), 0.0),
            Segment::straight(2, 1, 2, -1.0, Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0), 0.0),
        ];
        let net = RoadNetwork::build(segments, junctions).unwrap();
        let table = CapacityEstimator::default().estimate_network(&net);

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].segment, SegmentId(1));
        assert_eq!(
            table.errors,
            vec![AnalysisError::InvalidSegment {
                segment: SegmentId(2),
                width: -1.0
            }]
        );
    }

    #[test]
    fn test_table_summaries() {
        let table = CapacityEstimator::default().estimate_network(&fixtures::two_triangles());
        assert_eq!(table.records.len(), 7);
        assert!(table.errors.is_empty());
        let mean = table.mean_adjusted().unwrap();
        assert!(approx(mean * 7.0, table.total_adjusted()));
        assert!(table.get(SegmentId(7)).is_some());
        assert!(CapacityTable::default().mean_adjusted().is_none());
    }
}
