use super::segment::{Junction, JunctionId, Segment, SegmentId};

/// One incidence of a segment at a junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incidence {
    /// Index into `RoadNetwork::segments()`.
    pub segment: u32,
    /// Index into `RoadNetwork::junctions()` of the far end.
    /// Equals the owning junction for a self-loop.
    pub neighbor: u32,
}

/// Compressed Sparse Row adjacency over junction indices.
///
/// `offsets[i]..offsets[i + 1]` is the slice of `incidences` for junction `i`.
/// Every segment appears once at each endpoint; a self-loop appears once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    pub offsets: Vec<u32>,
    pub incidences: Vec<Incidence>,
}

impl Adjacency {
    /// Build from already validated segments; every endpoint must resolve
    /// through `junction_index`.
    pub(crate) fn build(
        junctions: &[Junction],
        segments: &[Segment],
        junction_index: impl Fn(JunctionId) -> Option<u32>,
    ) -> Self {
        let mut per_junction: Vec<Vec<Incidence>> = vec![Vec::new(); junctions.len()];

        for (seg_idx, segment) in segments.iter().enumerate() {
            let (Some(a), Some(b)) = (junction_index(segment.start), junction_index(segment.end))
            else {
                continue;
            };
            per_junction[a as usize].push(Incidence {
                segment: seg_idx as u32,
                neighbor: b,
            });
            if a != b {
                per_junction[b as usize].push(Incidence {
                    segment: seg_idx as u32,
                    neighbor: a,
                });
            }
        }

        let mut offsets = Vec::with_capacity(junctions.len() + 1);
        let mut incidences = Vec::new();
        for list in per_junction {
            offsets.push(incidences.len() as u32);
            incidences.extend(list);
        }
        offsets.push(incidences.len() as u32);

        Self {
            offsets,
            incidences,
        }
    }

    pub fn junction_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Incidences of the junction at `junction_idx`.
    pub fn incident(&self, junction_idx: u32) -> &[Incidence] {
        let start = self.offsets[junction_idx as usize] as usize;
        let end = self.offsets[junction_idx as usize + 1] as usize;
        &self.incidences[start..end]
    }

    /// Incident segment ids of the junction at `junction_idx`.
    pub fn incident_segments<'a>(
        &'a self,
        junction_idx: u32,
        segments: &'a [Segment],
    ) -> impl Iterator<Item = SegmentId> + 'a {
        self.incident(junction_idx)
            .iter()
            .map(move |inc| segments[inc.segment as usize].id)
    }
}
