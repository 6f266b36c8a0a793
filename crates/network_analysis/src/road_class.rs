//! Road classification by carriageway width and network-wide statistics.
//!
//! Classes are derived purely from width, never stored:
//!   Highway   width > 12 m
//!   Arterial  8 m <= width <= 12 m
//!   Collector 6 m <= width < 8 m
//!   Local     width < 6 m (including NaN)
//!
//! Rank order is Local < Collector < Arterial < Highway, and classification
//! is monotonic in width.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::road_network::{RoadNetwork, Segment};

// ---------------------------------------------------------------------------
// RoadClass
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
#[repr(u8)]
pub enum RoadClass {
    Local = 0,
    Collector = 1,
    Arterial = 2,
    Highway = 3,
}

impl RoadClass {
    pub const ALL: [RoadClass; 4] = [
        RoadClass::Highway,
        RoadClass::Arterial,
        RoadClass::Collector,
        RoadClass::Local,
    ];

    /// Classify a raw width in meters.
    pub fn from_width(width: f32) -> Self {
        if width > 12.0 {
            RoadClass::Highway
        } else if width >= 8.0 {
            RoadClass::Arterial
        } else if width >= 6.0 {
            RoadClass::Collector
        } else {
            RoadClass::Local
        }
    }

    /// Higher rank means a higher-capacity road.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            RoadClass::Highway => "Highway",
            RoadClass::Arterial => "Arterial",
            RoadClass::Collector => "Collector",
            RoadClass::Local => "Local",
        }
    }
}

/// Classify a segment from its width.
pub fn classify(segment: &Segment) -> RoadClass {
    RoadClass::from_width(segment.width)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Segment count per road class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ClassCounts {
    pub highway: u32,
    pub arterial: u32,
    pub collector: u32,
    pub local: u32,
}

impl ClassCounts {
    pub fn get(&self, class: RoadClass) -> u32 {
        match class {
            RoadClass::Highway => self.highway,
            RoadClass::Arterial => self.arterial,
            RoadClass::Collector => self.collector,
            RoadClass::Local => self.local,
        }
    }

    pub fn add(&mut self, class: RoadClass) {
        match class {
            RoadClass::Highway => self.highway += 1,
            RoadClass::Arterial => self.arterial += 1,
            RoadClass::Collector => self.collector += 1,
            RoadClass::Local => self.local += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.highway + self.arterial + self.collector + self.local
    }
}

/// Aggregate statistics of one network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct NetworkStats {
    pub total_roads: u32,
    /// Sum of planar arc lengths, in kilometers.
    pub total_length_km: f32,
    pub class_counts: ClassCounts,
    /// Junctions with degree >= 2 or explicitly flagged.
    pub junction_count: u32,
    /// Junctions with exactly one incident segment.
    pub dead_end_count: u32,
    /// Mean carriageway width in meters (0 for an empty network).
    pub mean_width: f32,
    /// `total_length_km / (total_roads + 1)`.
    pub network_density: f32,
}

/// Network density in km per segment.
///
/// The `+ 1` in the denominator keeps the value finite (and zero) for an
/// empty network. It slightly understates density for tiny networks; this
/// is the established convention and results are compared against it.
pub fn network_density(total_length_km: f32, total_roads: u32) -> f32 {
    total_length_km / (total_roads as f32 + 1.0)
}

pub fn aggregate_stats(network: &RoadNetwork) -> NetworkStats {
    let mut class_counts = ClassCounts::default();
    let mut total_length_m = 0.0_f64;
    let mut width_sum = 0.0_f64;

    for segment in network.segments() {
        class_counts.add(classify(segment));
        total_length_m += segment.arc_length() as f64;
        width_sum += segment.width as f64;
    }

    let total_roads = network.segment_count() as u32;
    let total_length_km = (total_length_m / 1000.0) as f32;
    let junctions = network.junctions();

    NetworkStats {
        total_roads,
        total_length_km,
        class_counts,
        junction_count: junctions.iter().filter(|j| j.is_intersection()).count() as u32,
        dead_end_count: junctions.iter().filter(|j| j.is_dead_end()).count() as u32,
        mean_width: if total_roads == 0 {
            0.0
        } else {
            (width_sum / total_roads as f64) as f32
        },
        network_density: network_density(total_length_km, total_roads),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::road_network::RoadNetwork;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(RoadClass::from_width(12.01), RoadClass::Highway);
        assert_eq!(RoadClass::from_width(12.0), RoadClass::Arterial);
        assert_eq!(RoadClass::from_width(8.0), RoadClass::Arterial);
        assert_eq!(RoadClass::from_width(7.99), RoadClass::Collector);
        assert_eq!(RoadClass::from_width(6.0), RoadClass::Collector);
        assert_eq!(RoadClass::from_width(5.99), RoadClass::Local);
        assert_eq!(RoadClass::from_width(0.0), RoadClass::Local);
        assert_eq!(RoadClass::from_width(f32::NAN), RoadClass::Local);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let mut prev = RoadClass::from_width(-5.0);
        let mut w = -5.0_f32;
        while w < 30.0 {
            let class = RoadClass::from_width(w);
            assert!(
                class.rank() >= prev.rank(),
                "rank dropped at width {w}: {prev:?} -> {class:?}"
            );
            prev = class;
            w += 0.05;
        }
    }

    #[test]
    fn test_rank_order() {
        assert!(RoadClass::Local < RoadClass::Collector);
        assert!(RoadClass::Collector < RoadClass::Arterial);
        assert!(RoadClass::Arterial < RoadClass::Highway);
    }

    #[test]
    fn test_empty_network_stats() {
        let net = RoadNetwork::build(Vec::new(), Vec::new()).unwrap();
        let stats = aggregate_stats(&net);
        assert_eq!(stats.total_roads, 0);
        assert_eq!(stats.total_length_km, 0.0);
        assert_eq!(stats.network_density, 0.0);
        assert_eq!(stats.mean_width, 0.0);
    }

    #[test]
    fn test_two_triangle_stats() {
        let net = fixtures::two_triangles();
        let stats = aggregate_stats(&net);

        assert_eq!(stats.total_roads, 7);
        // widths 15, 12.5 -> highway; 9, 11 -> arterial; 6.5, 7.5 -> collector; 5 -> local
        assert_eq!(stats.class_counts.highway, 2);
        assert_eq!(stats.class_counts.arterial, 2);
        assert_eq!(stats.class_counts.collector, 2);
        assert_eq!(stats.class_counts.local, 1);
        assert_eq!(stats.class_counts.total(), 7);
        assert_eq!(stats.junction_count, 6);
        assert_eq!(stats.dead_end_count, 0);

        let expected_m: f32 = net.segments().iter().map(|s| s.arc_length()).sum();
        assert!((stats.total_length_km - expected_m / 1000.0).abs() < 1e-4);
        assert!((stats.network_density - stats.total_length_km / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_flagged_dead_end_counts_as_junction() {
        let net = fixtures::path_abc();
        let stats = aggregate_stats(&net);
        // Only B has degree 2.
        assert_eq!(stats.junction_count, 1);
        assert_eq!(stats.dead_end_count, 2);

        let mut junctions = net.junctions().to_vec();
        junctions[0].flagged = true;
        let flagged = RoadNetwork::build(net.segments().to_vec(), junctions).unwrap();
        assert_eq!(aggregate_stats(&flagged).junction_count, 2);
    }
}
