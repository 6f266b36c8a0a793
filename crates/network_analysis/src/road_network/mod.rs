//! In-memory road network: segments (edges) and junctions (vertices).
//!
//! A [`RoadNetwork`] exclusively owns its segments and junctions. Construction
//! validates the graph (no dangling endpoints, no degenerate polylines, unique
//! ids), so every downstream stage can assume a well-formed graph.
//!
//! The CSR [`Adjacency`] is derived from segment endpoints. It is built once at
//! construction and cached; the two mutators (`insert_segment`,
//! `remove_segment`) drop the cache and it is rebuilt lazily on next access.

mod adjacency;
mod segment;

#[cfg(test)]
mod tests;

use std::sync::OnceLock;

use bevy::log::debug;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::error::{AnalysisError, NetworkDefect};

pub use adjacency::{Adjacency, Incidence};
pub use segment::{Junction, JunctionId, Segment, SegmentId};

/// Seed for network fingerprints. Must stay stable so cached reports keyed by
/// a fingerprint remain comparable within a process.
const FINGERPRINT_SEED: u64 = 0x524F_4144;

// ---------------------------------------------------------------------------
// External description
// ---------------------------------------------------------------------------

/// Serializable road network description, as handed over by importers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadNetworkDescription {
    #[serde(default)]
    pub name: String,
    pub junctions: Vec<Junction>,
    pub segments: Vec<Segment>,
}

impl RoadNetworkDescription {
    pub fn into_network(self) -> Result<RoadNetwork, AnalysisError> {
        Ok(RoadNetwork::build(self.segments, self.junctions)?.with_name(self.name))
    }
}

// ---------------------------------------------------------------------------
// RoadNetwork
// ---------------------------------------------------------------------------

/// Validated road graph. Segments and junctions are kept sorted by id.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    name: String,
    junctions: Vec<Junction>,
    segments: Vec<Segment>,
    adjacency: OnceLock<Adjacency>,
}

impl RoadNetwork {
    /// Build and validate a network.
    ///
    /// Fails with `MalformedNetwork` on dangling junction references,
    /// polylines with fewer than two points, non-finite coordinates or
    /// duplicate ids. Widths are not checked here; a non-positive width is a
    /// per-segment capacity fault, not a graph defect.
    pub fn build(
        mut segments: Vec<Segment>,
        mut junctions: Vec<Junction>,
    ) -> Result<Self, AnalysisError> {
        junctions.sort_by_key(|j| j.id);
        if let Some(dup) = junctions.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(NetworkDefect::DuplicateJunction(dup[0].id).into());
        }
        segments.sort_by_key(|s| s.id);
        if let Some(dup) = segments.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(NetworkDefect::DuplicateSegment(dup[0].id).into());
        }

        let mut network = Self {
            name: String::new(),
            junctions,
            segments,
            adjacency: OnceLock::new(),
        };
        for segment in &network.segments {
            network.check_segment(segment)?;
        }
        network.refresh_connections();
        let _ = network.adjacency.set(network.build_adjacency());

        debug!(
            "Built road network: {} segments, {} junctions",
            network.segments.len(),
            network.junctions.len()
        );
        Ok(network)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn junction_count(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.junctions.is_empty()
    }

    pub fn segment_index(&self, id: SegmentId) -> Option<u32> {
        self.segments
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| i as u32)
    }

    pub fn junction_index(&self, id: JunctionId) -> Option<u32> {
        self.junctions
            .binary_search_by_key(&id, |j| j.id)
            .ok()
            .map(|i| i as u32)
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segment_index(id).map(|i| &self.segments[i as usize])
    }

    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.junction_index(id).map(|i| &self.junctions[i as usize])
    }

    /// Cached CSR adjacency; rebuilt here if a mutation invalidated it.
    pub fn adjacency(&self) -> &Adjacency {
        self.adjacency.get_or_init(|| self.build_adjacency())
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Add a segment. Validated exactly like `build`; on error the network is
    /// left unchanged.
    pub fn insert_segment(&mut self, segment: Segment) -> Result<(), AnalysisError> {
        let pos = match self.segments.binary_search_by_key(&segment.id, |s| s.id) {
            Ok(_) => return Err(NetworkDefect::DuplicateSegment(segment.id).into()),
            Err(pos) => pos,
        };
        self.check_segment(&segment)?;
        self.segments.insert(pos, segment);
        self.invalidate();
        Ok(())
    }

    /// Remove a segment by id, returning it if it existed.
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<Segment> {
        let idx = self.segment_index(id)?;
        let removed = self.segments.remove(idx as usize);
        self.invalidate();
        Some(removed)
    }

    fn invalidate(&mut self) {
        self.refresh_connections();
        self.adjacency = OnceLock::new();
    }

    // -----------------------------------------------------------------------
    // Fingerprint
    // -----------------------------------------------------------------------

    /// Deterministic 64-bit xxh3 hash over ids, endpoints, widths and geometry.
    ///
    /// Two networks with equal fingerprints produce identical analyses.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::with_seed(FINGERPRINT_SEED);
        for junction in &self.junctions {
            hasher.update(&junction.id.0.to_le_bytes());
            hasher.update(&[junction.flagged as u8]);
        }
        for segment in &self.segments {
            hasher.update(&segment.id.0.to_le_bytes());
            hasher.update(&segment.start.0.to_le_bytes());
            hasher.update(&segment.end.0.to_le_bytes());
            hasher.update(&segment.width.to_bits().to_le_bytes());
            match segment.elevation {
                Some(e) => {
                    hasher.update(&[1]);
                    hasher.update(&e.to_bits().to_le_bytes());
                }
                None => hasher.update(&[0]),
            }
            for p in &segment.polyline {
                for c in p.to_array() {
                    hasher.update(&c.to_bits().to_le_bytes());
                }
            }
        }
        hasher.digest()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_segment(&self, segment: &Segment) -> Result<(), NetworkDefect> {
        if segment.polyline.len() < 2 {
            return Err(NetworkDefect::DegeneratePolyline {
                segment: segment.id,
                points: segment.polyline.len() as u32,
            });
        }
        if segment.polyline.iter().any(|p| !p.is_finite()) {
            return Err(NetworkDefect::NonFiniteGeometry {
                segment: segment.id,
            });
        }
        for junction in [segment.start, segment.end] {
            if self.junction_index(junction).is_none() {
                return Err(NetworkDefect::DanglingJunction {
                    segment: segment.id,
                    junction,
                });
            }
        }
        Ok(())
    }

    fn refresh_connections(&mut self) {
        for junction in &mut self.junctions {
            junction.connected_segments.clear();
        }
        for seg_idx in 0..self.segments.len() {
            let (id, start, end) = {
                let s = &self.segments[seg_idx];
                (s.id, s.start, s.end)
            };
            if let Some(a) = self.junction_index(start) {
                self.junctions[a as usize].connected_segments.push(id);
            }
            if end != start {
                if let Some(b) = self.junction_index(end) {
                    self.junctions[b as usize].connected_segments.push(id);
                }
            }
        }
    }

    fn build_adjacency(&self) -> Adjacency {
        Adjacency::build(&self.junctions, &self.segments, |id| self.junction_index(id))
    }
}
