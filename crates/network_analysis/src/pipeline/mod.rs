//! Orchestration of a full analysis pass.
//!
//! [`AnalysisPipeline::analyze`] runs, in order: statistics, capacity,
//! vulnerability, scenario synthesis and level of service. The cancel token
//! is checked between stages and a cancelled pass publishes nothing.
//!
//! Estimated results are a separate, explicitly named path:
//! [`AnalysisPipeline::estimate_city`] works from catalog figures and
//! returns an [`EstimatedBundle`] tagged [`Provenance::Estimated`]. A failed
//! network analysis is returned as an error and is never replaced by an
//! estimate.

mod cancel;
pub mod plugin;


use bevy::log::info;
use bevy::math::Vec2;
use bevy::tasks::{ComputeTaskPool, TaskPool};
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::capacity::{CapacityEstimator, CapacityTable};
use crate::city_profiles::{self, nominal_width, CityProfile};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::los::{grade_flow, LosGrade};
use crate::road_class::{aggregate_stats, network_density, NetworkStats, RoadClass};
use crate::road_network::{RoadNetwork, RoadNetworkDescription, Segment};
use crate::scenario::{ScenarioSeries, ScenarioSynthesizer};
use crate::vulnerability::{VulnerabilityAnalyzer, VulnerabilityReport};

pub use cancel::CancelToken;
pub use plugin::{
    AnalysisCompleted, AnalysisOutput, AnalysisRequest, AnalysisResults, AnalysisSource,
    CancelAnalysis, InFlightAnalyses, NetworkAnalysisPlugin, RequestId,
};

/// Where a bundle's numbers come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum Provenance {
    /// Computed from a supplied road network.
    Analyzed,
    /// Derived from catalog figures; not a measurement of any network.
    Estimated,
}

// ---------------------------------------------------------------------------
// Bundles
// ---------------------------------------------------------------------------

/// Everything one pass produces for one network, ready for external export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct AnalysisBundle {
    pub provenance: Provenance,
    pub network: String,
    /// xxh3 fingerprint of the analyzed network.
    pub fingerprint: u64,
    pub stats: NetworkStats,
    pub capacity: CapacityTable,
    pub vulnerability: VulnerabilityReport,
    pub scenario: ScenarioSeries,
    /// Mean scenario flow against mean adjusted capacity.
    pub level_of_service: Option<LosGrade>,
}

impl AnalysisBundle {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bitcode::Error> {
        bitcode::decode(bytes)
    }
}

/// Capacity of one road class at its nominal width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ClassCapacity {
    pub road_class: RoadClass,
    pub nominal_width: f32,
    pub road_count: u32,
    pub adjusted_capacity: f32,
}

/// Estimated figures for a catalog city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct EstimatedBundle {
    pub provenance: Provenance,
    pub city: CityProfile,
    pub stats: NetworkStats,
    pub class_capacity: Vec<ClassCapacity>,
    pub scenario: ScenarioSeries,
    pub level_of_service: Option<LosGrade>,
}

impl EstimatedBundle {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    /// Pipeline over a validated configuration. Fails with `InvalidConfig`
    /// for factors outside `[0, 1]` and the other out-of-domain values
    /// rejected by [`AnalysisConfig::validate`].
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn synthesizer(&self) -> ScenarioSynthesizer {
        ScenarioSynthesizer::new(
            self.config.scenario.clone(),
            self.config.estimators.clone(),
        )
    }

    fn synthesize(&self) -> ScenarioSeries {
        self.synthesizer().synthesize(
            self.config.simulation_duration,
            &self.config.vehicle_composition,
            self.config.random_seed,
        )
    }

    /// Run every stage on one network.
    pub fn analyze(
        &self,
        network: &RoadNetwork,
        cancel: &CancelToken,
    ) -> Result<AnalysisBundle, AnalysisError> {
        cancel.check("statistics")?;
        let stats = aggregate_stats(network);

        cancel.check("capacity")?;
        let capacity = CapacityEstimator::from_config(&self.config).estimate_network(network);

        cancel.check("vulnerability")?;
        let vulnerability = VulnerabilityAnalyzer::from_config(&self.config).analyze(network);

        cancel.check("scenario")?;
        let scenario = self.synthesize();
        let level_of_service = grade_flow(scenario.metrics().mean_flow, capacity.mean_adjusted());

        cancel.check("publishing")?;
        info!(
            "Analyzed '{}': {} segments, {} critical connections, {} capacity errors",
            network.name(),
            stats.total_roads,
            vulnerability.critical_connections.len(),
            capacity.errors.len()
        );

        Ok(AnalysisBundle {
            provenance: Provenance::Analyzed,
            network: network.name().to_string(),
            fingerprint: network.fingerprint(),
            stats,
            capacity,
            vulnerability,
            scenario,
            level_of_service,
        })
    }

    /// Build the network from its description, then analyze it. A
    /// malformed description fails before any stage runs.
    pub fn analyze_description(
        &self,
        description: RoadNetworkDescription,
        cancel: &CancelToken,
    ) -> Result<AnalysisBundle, AnalysisError> {
        let network = description.into_network()?;
        self.analyze(&network, cancel)
    }

    /// Analyze independent networks in parallel on the compute task pool.
    /// Results are in input order.
    pub fn analyze_all(
        &self,
        networks: &[RoadNetwork],
        cancel: &CancelToken,
    ) -> Vec<Result<AnalysisBundle, AnalysisError>> {
        let pool = ComputeTaskPool::get_or_init(TaskPool::default);
        pool.scope(|scope| {
            for network in networks {
                scope.spawn(async move { self.analyze(network, cancel) });
            }
        })
    }

    /// Estimated figures for a catalog city. This is never a fallback for a
    /// failed analysis; callers ask for it by name.
    pub fn estimate_city(&self, name: &str) -> Result<EstimatedBundle, AnalysisError> {
        let city = city_profiles::lookup(name)?;
        let counts = city.road_counts;
        let estimator = CapacityEstimator::from_config(&self.config);

        let mut class_capacity = Vec::with_capacity(RoadClass::ALL.len());
        let mut width_sum = 0.0_f64;
        let mut capacity_sum = 0.0_f64;
        for class in RoadClass::ALL {
            let width = nominal_width(class);
            let probe = Segment::straight(0, 0, 1, width, Vec2::ZERO, Vec2::X, 0.0);
            let record = estimator.estimate(&probe)?;
            let road_count = counts.get(class);
            width_sum += width as f64 * road_count as f64;
            capacity_sum += record.adjusted_capacity as f64 * road_count as f64;
            class_capacity.push(ClassCapacity {
                road_class: class,
                nominal_width: width,
                road_count,
                adjusted_capacity: record.adjusted_capacity,
            });
        }

        let total_roads = counts.total();
        let mean = |sum: f64| {
            if total_roads == 0 {
                0.0
            } else {
                (sum / total_roads as f64) as f32
            }
        };
        let stats = NetworkStats {
            total_roads,
            total_length_km: city.road_length_km,
            class_counts: counts,
            junction_count: 0,
            dead_end_count: 0,
            mean_width: mean(width_sum),
            network_density: network_density(city.road_length_km, total_roads),
        };

        let scenario = self.synthesize();
        let mean_capacity = (total_roads > 0).then(|| mean(capacity_sum));
        let level_of_service = grade_flow(scenario.metrics().mean_flow, mean_capacity);

        info!(
            "Estimated figures for {} from catalog profile (not measured)",
            city.name
        );

        Ok(EstimatedBundle {
            provenance: Provenance::Estimated,
            city,
            stats,
            class_capacity,
            scenario,
            level_of_service,
        })
    }
}
