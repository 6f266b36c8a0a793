//! Flood vulnerability analysis.
//!
//! Three stages over one network snapshot:
//!
//! 1. [`flood`]: tag segments at or below the configured elevation
//!    percentile as flood-prone.
//! 2. [`bridges`]: find every bridge and count the flood-prone segments on
//!    each side of it. A bridge with flood-prone road on either side is a
//!    critical connection.
//! 3. [`alternatives`]: for each critical connection, search up to K
//!    edge-disjoint routes between its endpoints without it.
//!
//! A critical connection with no alternative route is reported, not
//! treated as an error. Malformed networks never reach this module; they
//! are rejected by [`RoadNetwork::build`].

pub mod alternatives;
pub mod bridges;
pub mod flood;


use std::collections::{BTreeMap, BTreeSet};

use bevy::log::debug;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::road_network::{RoadNetwork, SegmentId};

pub use alternatives::{alternative_routes, AlternativeRoute};
pub use bridges::{count_components, find_bridges, Bridge};
pub use flood::{percentile, tag_flood_prone};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct VulnerabilityReport {
    /// Elevation at or below which segments are flood-prone. `None` for a
    /// network without segments.
    pub flood_threshold: Option<f32>,
    pub flood_prone: BTreeSet<SegmentId>,
    /// Every bridge, critical or not, ordered by segment id.
    pub bridges: Vec<Bridge>,
    pub critical_connections: BTreeSet<SegmentId>,
    /// Alternative routes per critical connection; an empty list means the
    /// network has no redundancy there.
    pub alternatives: BTreeMap<SegmentId, Vec<AlternativeRoute>>,
}

impl VulnerabilityReport {
    pub fn is_critical(&self, segment: SegmentId) -> bool {
        self.critical_connections.contains(&segment)
    }

    pub fn bridge(&self, segment: SegmentId) -> Option<&Bridge> {
        self.bridges.iter().find(|b| b.segment == segment)
    }

    /// Critical connections without any alternative route.
    pub fn unprotected(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.alternatives
            .iter()
            .filter(|(_, routes)| routes.is_empty())
            .map(|(id, _)| *id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VulnerabilityAnalyzer {
    pub flood_percentile: f32,
    pub alternative_route_count: usize,
}

impl Default for VulnerabilityAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl VulnerabilityAnalyzer {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            flood_percentile: config.flood_percentile,
            alternative_route_count: config.alternative_route_count,
        }
    }

    pub fn analyze(&self, network: &RoadNetwork) -> VulnerabilityReport {
        let (flood_threshold, flood_prone) = tag_flood_prone(network, self.flood_percentile);

        let flags: Vec<bool> = network
            .segments()
            .iter()
            .map(|s| flood_prone.contains(&s.id))
            .collect();
        let bridges = find_bridges(network, &flags);

        let critical_connections: BTreeSet<SegmentId> = bridges
            .iter()
            .filter(|b| b.is_critical())
            .map(|b| b.segment)
            .collect();

        let alternatives = critical_connections
            .iter()
            .map(|&id| {
                (
                    id,
                    alternative_routes(network, id, self.alternative_route_count),
                )
            })
            .collect();

        debug!(
            "Vulnerability of '{}': {} flood-prone, {} bridges, {} critical",
            network.name(),
            flood_prone.len(),
            bridges.len(),
            critical_connections.len()
        );

        VulnerabilityReport {
            flood_threshold,
            flood_prone,
            bridges,
            critical_connections,
            alternatives,
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    fingerprint: u64,
    segment_count: usize,
    junction_count: usize,
    flood_percentile_bits: u32,
    alternative_route_count: usize,
}

impl CacheKey {
    fn new(analyzer: &VulnerabilityAnalyzer, network: &RoadNetwork) -> Self {
        Self {
            fingerprint: network.fingerprint(),
            segment_count: network.segment_count(),
            junction_count: network.junction_count(),
            flood_percentile_bits: analyzer.flood_percentile.to_bits(),
            alternative_route_count: analyzer.alternative_route_count,
        }
    }
}

/// Keeps the last report and recomputes only when the network (64-bit
/// fingerprint plus segment and junction counts) or the analyzer settings
/// change.
#[derive(Debug, Clone, Default)]
pub struct VulnerabilityCache {
    entry: Option<(CacheKey, VulnerabilityReport)>,
    computations: u32,
}

impl VulnerabilityCache {
    pub fn get_or_compute(
        &mut self,
        analyzer: &VulnerabilityAnalyzer,
        network: &RoadNetwork,
    ) -> &VulnerabilityReport {
        let key = CacheKey::new(analyzer, network);
        if self.entry.as_ref().is_some_and(|(k, _)| *k != key) {
            self.entry = None;
        }
        if self.entry.is_none() {
            self.computations += 1;
        }
        let (_, report) = self
            .entry
            .get_or_insert_with(|| (key, analyzer.analyze(network)));
        report
    }

    /// Number of full analyses run so far.
    pub fn computations(&self) -> u32 {
        self.computations
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}
