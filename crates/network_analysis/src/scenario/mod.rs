//! Synthetic traffic scenarios.
//!
//! A scenario is a per-minute series of flow (veh/h) and density (veh/km)
//! following two sinusoids with bounded seeded noise:
//!
//! | Quantity | Shape                                | Noise (default) |
//! |----------|--------------------------------------|-----------------|
//! | flow     | `max(0, 1200 + 400 * sin(0.2 t) + n)`  | +/- 100         |
//! | density  | `max(0, 45 + 15 * sin(0.15 t) + n)`    | +/- 5           |
//!
//! Speed per sample is `flow / density`, capped at the free-flow speed (and
//! equal to it when density is zero). The series is fully determined by
//! `(duration, composition, seed, config)`; there is no ambient randomness.
//!
//! Aggregate KPIs are computed by the illustrative estimators in
//! [`estimators`].

pub mod estimators;


use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::composition::VehicleComposition;
use crate::sim_rng::SimRng;

pub use estimators::{EstimatorParams, MixCoefficients, VehicleProfile};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// One `base + amplitude * sin(frequency * t)` curve plus a noise bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wave {
    pub base: f32,
    pub amplitude: f32,
    /// Radians per minute.
    pub frequency: f32,
    /// Noise is drawn uniformly from `[-noise, noise]`.
    pub noise: f32,
}

impl Wave {
    fn at(&self, minute: u32) -> f32 {
        self.base + self.amplitude * (self.frequency * minute as f32).sin()
    }

    /// Largest value the curve can take, noise included.
    pub fn ceiling(&self) -> f32 {
        self.base + self.amplitude.abs() + self.noise.max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioParams {
    pub flow: Wave,
    pub density: Wave,
    /// Speed cap in km/h.
    pub free_flow_speed: f32,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            flow: Wave {
                base: 1200.0,
                amplitude: 400.0,
                frequency: 0.2,
                noise: 100.0,
            },
            density: Wave {
                base: 45.0,
                amplitude: 15.0,
                frequency: 0.15,
                noise: 5.0,
            },
            free_flow_speed: 80.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ScenarioSample {
    pub minute: u32,
    /// Vehicles per hour.
    pub flow: f32,
    /// Vehicles per km.
    pub density: f32,
    /// km/h.
    pub speed: f32,
}

/// Derived scalars over a series. Fuel and emissions are estimates, not
/// measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ScenarioMetrics {
    pub mean_speed: f32,
    pub mean_flow: f32,
    pub mean_density: f32,
    /// 0 (free flow) to 1 (jammed).
    pub congestion_index: f32,
    pub fuel_litres: f32,
    pub emissions_kg_co2: f32,
}

/// An immutable synthesized run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ScenarioSeries {
    pub seed: u64,
    pub duration_minutes: u32,
    pub composition: VehicleComposition,
    samples: Vec<ScenarioSample>,
    metrics: ScenarioMetrics,
}

impl ScenarioSeries {
    pub fn samples(&self) -> &[ScenarioSample] {
        &self.samples
    }

    pub fn metrics(&self) -> &ScenarioMetrics {
        &self.metrics
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioSynthesizer {
    params: ScenarioParams,
    estimators: EstimatorParams,
}

impl ScenarioSynthesizer {
    pub fn new(params: ScenarioParams, estimators: EstimatorParams) -> Self {
        Self { params, estimators }
    }

    pub fn params(&self) -> &ScenarioParams {
        &self.params
    }

    /// Generate one sample per integer minute in `[0, duration_minutes]`.
    pub fn synthesize(
        &self,
        duration_minutes: u32,
        composition: &VehicleComposition,
        seed: u64,
    ) -> ScenarioSeries {
        let mut rng = SimRng::from_seed_u64(seed);
        let p = &self.params;

        let samples: Vec<ScenarioSample> = (0..=duration_minutes)
            .map(|minute| {
                let flow = (p.flow.at(minute) + rng.noise(p.flow.noise)).max(0.0);
                let density = (p.density.at(minute) + rng.noise(p.density.noise)).max(0.0);
                let speed = if density > 0.0 {
                    (flow / density).min(p.free_flow_speed)
                } else {
                    p.free_flow_speed
                };
                ScenarioSample {
                    minute,
                    flow,
                    density,
                    speed,
                }
            })
            .collect();

        let metrics = self.metrics(&samples, duration_minutes, composition);
        ScenarioSeries {
            seed,
            duration_minutes,
            composition: composition.clone(),
            samples,
            metrics,
        }
    }

    fn metrics(
        &self,
        samples: &[ScenarioSample],
        duration_minutes: u32,
        composition: &VehicleComposition,
    ) -> ScenarioMetrics {
        let n = samples.len().max(1) as f64;
        let mean = |f: fn(&ScenarioSample) -> f32| {
            (samples.iter().map(|s| f(s) as f64).sum::<f64>() / n) as f32
        };
        let mean_speed = mean(|s| s.speed);
        let mean_flow = mean(|s| s.flow);
        let mean_density = mean(|s| s.density);

        let est = &self.estimators;
        let mix = est.mix(composition);
        let congestion_index = est.congestion_index(mean_density, &mix);
        let vehicle_km = est.vehicle_km(mean_flow, duration_minutes);

        ScenarioMetrics {
            mean_speed,
            mean_flow,
            mean_density,
            congestion_index,
            fuel_litres: est.fuel_litres(vehicle_km, &mix, congestion_index),
            emissions_kg_co2: est.emissions_kg_co2(vehicle_km, &mix, congestion_index),
        }
    }
}
