//! Built-in catalog of city road-network profiles.
//!
//! Profiles are coarse published figures (population, road length, road
//! counts per class), not geometry. They feed the explicitly requested
//! estimated analysis in [`crate::pipeline::AnalysisPipeline::estimate_city`]
//! and never stand in for a failed network analysis.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::road_class::{ClassCounts, RoadClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum TrafficDensity {
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct CityProfile {
    pub name: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
    pub population: u64,
    pub road_length_km: f32,
    pub traffic_density: TrafficDensity,
    pub major_roads: Vec<String>,
    pub challenges: Vec<String>,
    pub road_counts: ClassCounts,
}

/// Representative carriageway width per class, in meters, used when only
/// road counts are known.
pub fn nominal_width(class: RoadClass) -> f32 {
    match class {
        RoadClass::Highway => 14.0,
        RoadClass::Arterial => 10.0,
        RoadClass::Collector => 7.0,
        RoadClass::Local => 4.5,
    }
}

#[allow(clippy::too_many_arguments)]
fn profile(
    name: &str,
    state: &str,
    (lat, lng): (f64, f64),
    population: u64,
    road_length_km: f32,
    traffic_density: TrafficDensity,
    major_roads: [&str; 4],
    challenges: [&str; 4],
    [highway, arterial, collector, local]: [u32; 4],
) -> CityProfile {
    CityProfile {
        name: name.to_string(),
        state: state.to_string(),
        lat,
        lng,
        population,
        road_length_km,
        traffic_density,
        major_roads: major_roads.iter().map(|s| s.to_string()).collect(),
        challenges: challenges.iter().map(|s| s.to_string()).collect(),
        road_counts: ClassCounts {
            highway,
            arterial,
            collector,
            local,
        },
    }
}

/// All built-in profiles.
pub fn catalog() -> Vec<CityProfile> {
    use TrafficDensity::{High, VeryHigh};
    vec![
        profile(
            "Hyderabad",
            "Telangana",
            (17.3850, 78.4867),
            10_000_000,
            12_500.0,
            High,
            ["PVNR Expressway", "ORR", "Nehru Outer Ring Road", "Cyberabad Road"],
            ["Rapid IT expansion", "Mixed traffic", "Frequent rains", "Construction zones"],
            [450, 120, 850, 5200],
        ),
        profile(
            "Mumbai",
            "Maharashtra",
            (19.0760, 72.8777),
            20_400_000,
            18_000.0,
            VeryHigh,
            ["Eastern Express Highway", "Western Express Highway", "SCLR", "JVLR"],
            ["Island geography", "Monsoons", "Slums", "Bridge bottlenecks"],
            [12, 45, 180, 2800],
        ),
        profile(
            "Delhi",
            "Delhi",
            (28.7041, 77.1025),
            32_900_000,
            32_000.0,
            VeryHigh,
            ["Ring Road", "Outer Ring Road", "DND Flyway", "Noida Expressway"],
            ["Air pollution", "Mixed vehicle types", "Extreme weather", "Encroachments"],
            [28, 85, 420, 8200],
        ),
        profile(
            "Chennai",
            "Tamil Nadu",
            (13.0827, 80.2707),
            11_700_000,
            9_800.0,
            High,
            ["GST Road", "ECR", "OMR", "Mount Road"],
            ["Coastal flooding", "Two-wheeler dominance", "IT corridor traffic", "Heat waves"],
            [18, 42, 230, 3100],
        ),
        profile(
            "Bangalore",
            "Karnataka",
            (12.9716, 77.5946),
            13_200_000,
            14_500.0,
            VeryHigh,
            ["ORR", "Hosur Road", "Bannerghatta Road", "Electronic City"],
            ["Tech hub traffic", "Lakes/terrain", "Metro construction", "Narrow roads"],
            [22, 65, 340, 4800],
        ),
        profile(
            "Kolkata",
            "West Bengal",
            (22.5726, 88.3639),
            14_700_000,
            8_200.0,
            High,
            ["AJC Bose Road", "EM Bypass", "VIP Road", "Jessore Road"],
            ["River crossings", "Old infrastructure", "Monsoons", "Hand-pulled rickshaws"],
            [8, 25, 120, 2200],
        ),
    ]
}

/// Case-insensitive lookup by city name.
pub fn lookup(name: &str) -> Result<CityProfile, AnalysisError> {
    let wanted = name.trim();
    catalog()
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| AnalysisError::UnknownCity(wanted.to_string()))
}
