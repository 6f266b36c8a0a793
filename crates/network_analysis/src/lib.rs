//! Road network analysis core.
//!
//! Takes a validated [`RoadNetwork`] plus an [`AnalysisConfig`] and produces
//! classification statistics, mixed-traffic capacities, a flood
//! vulnerability report and a synthetic traffic scenario, bundled per
//! network for external reporting. No file I/O, rendering or transmission
//! happens here.

pub mod capacity;
pub mod city_profiles;
pub mod composition;
pub mod config;
pub mod error;
pub mod los;
pub mod pipeline;
pub mod road_class;
pub mod road_network;
pub mod scenario;
pub mod sim_rng;
pub mod vulnerability;

#[cfg(any(test, feature = "bench"))]
pub mod fixtures;

pub use capacity::{CapacityEstimator, CapacityRecord, CapacityTable};
pub use composition::{CompositionNormalizer, VehicleComposition};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, NetworkDefect};
pub use los::LosGrade;
pub use pipeline::{
    AnalysisBundle, AnalysisPipeline, CancelToken, EstimatedBundle, NetworkAnalysisPlugin,
    Provenance,
};
pub use road_class::{aggregate_stats, classify, NetworkStats, RoadClass};
pub use road_network::{
    Junction, JunctionId, RoadNetwork, RoadNetworkDescription, Segment, SegmentId,
};
pub use scenario::{ScenarioSeries, ScenarioSynthesizer};
pub use vulnerability::{VulnerabilityAnalyzer, VulnerabilityCache, VulnerabilityReport};
