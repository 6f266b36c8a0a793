//! Illustrative KPI estimators over a vehicle mix and mean traffic state.
//!
//! These are configuration-driven scalar formulas, not calibrated physical
//! models. Their outputs are estimates and must not be reported as measured
//! data.
//!
//! ## Formulas
//!
//! `pcu_factor = sum(fraction_i * pcu_i)`
//! `congestion_index = clamp(mean_density * pcu_factor / jam_density, 0, 1)`
//! `vehicle_km = mean_flow * hours * trip_length_km`
//! `fuel = vehicle_km * sum(fraction_i * fuel_i) * (1 + penalty * congestion_index)`
//! `co2 = vehicle_km * sum(fraction_i * fuel_i * co2_i) * (1 + penalty * congestion_index)`

use std::collections::BTreeMap;

use bevy::log::warn;
use serde::{Deserialize, Serialize};

use crate::composition::VehicleComposition;

/// Per-vehicle-type coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfile {
    /// Passenger car units: road space relative to one car.
    pub pcu: f32,
    /// Fuel burned per vehicle-km, in litres.
    pub fuel_litres_per_km: f32,
    /// CO2 emitted per litre of fuel, in kg.
    pub co2_kg_per_litre: f32,
}

const PETROL_CO2: f32 = 2.31;
const DIESEL_CO2: f32 = 2.68;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimatorParams {
    /// Jam density in PCU per km.
    pub jam_density: f32,
    /// Distance each counted vehicle is assumed to travel, in km.
    pub trip_length_km: f32,
    /// Extra fuel per unit of congestion index.
    pub congestion_fuel_penalty: f32,
    pub vehicle_profiles: BTreeMap<String, VehicleProfile>,
    /// Used for vehicle types missing from `vehicle_profiles`.
    pub fallback_profile: VehicleProfile,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        let car = VehicleProfile {
            pcu: 1.0,
            fuel_litres_per_km: 0.07,
            co2_kg_per_litre: PETROL_CO2,
        };
        let vehicle_profiles = [
            ("car", car),
            (
                "two_wheeler",
                VehicleProfile {
                    pcu: 0.5,
                    fuel_litres_per_km: 0.025,
                    co2_kg_per_litre: PETROL_CO2,
                },
            ),
            (
                "auto_rickshaw",
                VehicleProfile {
                    pcu: 1.2,
                    fuel_litres_per_km: 0.035,
                    co2_kg_per_litre: PETROL_CO2,
                },
            ),
            (
                "bus",
                VehicleProfile {
                    pcu: 3.0,
                    fuel_litres_per_km: 0.30,
                    co2_kg_per_litre: DIESEL_CO2,
                },
            ),
            (
                "truck",
                VehicleProfile {
                    pcu: 3.0,
                    fuel_litres_per_km: 0.25,
                    co2_kg_per_litre: DIESEL_CO2,
                },
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            jam_density: 150.0,
            trip_length_km: 1.0,
            congestion_fuel_penalty: 0.5,
            vehicle_profiles,
            fallback_profile: car,
        }
    }
}

/// Composition-weighted coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MixCoefficients {
    pub pcu: f32,
    pub fuel_litres_per_km: f32,
    pub co2_kg_per_km: f32,
}

impl EstimatorParams {
    pub fn profile(&self, vehicle: &str) -> &VehicleProfile {
        match self.vehicle_profiles.get(vehicle) {
            Some(p) => p,
            None => {
                warn!("No vehicle profile for '{vehicle}', using fallback profile");
                &self.fallback_profile
            }
        }
    }

    pub fn mix(&self, composition: &VehicleComposition) -> MixCoefficients {
        let mut mix = MixCoefficients::default();
        for share in composition.shares() {
            let f = share.percent / 100.0;
            let p = self.profile(&share.vehicle);
            mix.pcu += f * p.pcu;
            mix.fuel_litres_per_km += f * p.fuel_litres_per_km;
            mix.co2_kg_per_km += f * p.fuel_litres_per_km * p.co2_kg_per_litre;
        }
        mix
    }

    pub fn congestion_index(&self, mean_density: f32, mix: &MixCoefficients) -> f32 {
        if self.jam_density <= 0.0 {
            return 0.0;
        }
        (mean_density * mix.pcu / self.jam_density).clamp(0.0, 1.0)
    }

    pub fn vehicle_km(&self, mean_flow: f32, duration_minutes: u32) -> f32 {
        mean_flow.max(0.0) * (duration_minutes as f32 / 60.0) * self.trip_length_km
    }

    fn penalty(&self, congestion_index: f32) -> f32 {
        1.0 + self.congestion_fuel_penalty * congestion_index
    }

    pub fn fuel_litres(&self, vehicle_km: f32, mix: &MixCoefficients, congestion_index: f32) -> f32 {
        vehicle_km * mix.fuel_litres_per_km * self.penalty(congestion_index)
    }

    pub fn emissions_kg_co2(
        &self,
        vehicle_km: f32,
        mix: &MixCoefficients,
        congestion_index: f32,
    ) -> f32 {
        vehicle_km * mix.co2_kg_per_km * self.penalty(congestion_index)
    }
}
