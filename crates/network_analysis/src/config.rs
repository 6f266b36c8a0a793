//! Data-driven analysis parameters.
//!
//! Every tunable of the analysis lives in one [`AnalysisConfig`] resource.
//! It deserializes from JSON with camelCase keys, and every field has a
//! default, so `{}` is a complete configuration.
//!
//! | Key                     | Default                     |
//! |-------------------------|-----------------------------|
//! | `encroachmentFactor`    | 0.8                         |
//! | `mixedTrafficFactors`   | `[0.7, 0.6, 0.5, 0.4]`      |
//! | `floodPercentile`       | 25                          |
//! | `alternativeRouteCount` | 3                           |
//! | `simulationDuration`    | 60 (minutes)                |
//! | `vehicleComposition`    | car 25, two_wheeler 45, ... |
//! | `randomSeed`            | 42                          |
//! | `capacity`              | see [`CapacityParams`]      |
//! | `scenario`              | see [`ScenarioParams`]      |
//! | `estimators`            | see [`EstimatorParams`]     |

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::capacity::CapacityParams;
use crate::composition::VehicleComposition;
use crate::error::AnalysisError;
use crate::scenario::{EstimatorParams, ScenarioParams};
use crate::sim_rng::DEFAULT_SEED;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Share of carriageway capacity left after parking, vending and
    /// obstructions.
    pub encroachment_factor: f32,
    /// Mixed-traffic derating per width band, widest band first.
    pub mixed_traffic_factors: [f32; 4],
    /// Segments at or below this elevation percentile are flood-prone.
    pub flood_percentile: f32,
    /// Alternative routes searched per critical connection.
    pub alternative_route_count: usize,
    /// Scenario length in minutes.
    pub simulation_duration: u32,
    pub vehicle_composition: VehicleComposition,
    pub random_seed: u64,
    pub capacity: CapacityParams,
    pub scenario: ScenarioParams,
    pub estimators: EstimatorParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            encroachment_factor: 0.8,
            mixed_traffic_factors: [0.7, 0.6, 0.5, 0.4],
            flood_percentile: 25.0,
            alternative_route_count: 3,
            simulation_duration: 60,
            vehicle_composition: VehicleComposition::default(),
            random_seed: DEFAULT_SEED,
            capacity: CapacityParams::default(),
            scenario: ScenarioParams::default(),
            estimators: EstimatorParams::default(),
        }
    }
}

fn unit_interval(name: &str, value: f32) -> Result<(), AnalysisError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f32) -> Result<(), AnalysisError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        unit_interval("encroachmentFactor", self.encroachment_factor)?;
        for (i, f) in self.mixed_traffic_factors.iter().enumerate() {
            unit_interval(&format!("mixedTrafficFactors[{i}]"), *f)?;
        }
        if !(0.0..=100.0).contains(&self.flood_percentile) {
            return Err(AnalysisError::InvalidConfig(format!(
                "floodPercentile must be within [0, 100], got {}",
                self.flood_percentile
            )));
        }

        let capacity = &self.capacity;
        if !(capacity.lane_width > 0.0) || !capacity.lane_width.is_finite() {
            return Err(AnalysisError::InvalidConfig(format!(
                "capacity.laneWidth must be positive, got {}",
                capacity.lane_width
            )));
        }
        for (i, band) in capacity.bands.iter().enumerate() {
            non_negative(&format!("capacity.bands[{i}].baseRate"), band.base_rate)?;
        }
        if capacity.bands.windows(2).any(|w| w[0].min_width < w[1].min_width) {
            return Err(AnalysisError::InvalidConfig(
                "capacity.bands must be ordered widest first".to_string(),
            ));
        }

        non_negative("scenario.flow.noise", self.scenario.flow.noise)?;
        non_negative("scenario.density.noise", self.scenario.density.noise)?;
        non_negative("scenario.freeFlowSpeed", self.scenario.free_flow_speed)?;

        let est = &self.estimators;
        non_negative("estimators.jamDensity", est.jam_density)?;
        non_negative("estimators.tripLengthKm", est.trip_length_km)?;
        non_negative(
            "estimators.congestionFuelPenalty",
            est.congestion_fuel_penalty,
        )?;
        Ok(())
    }
}
