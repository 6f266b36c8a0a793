use bevy::math::{Vec2, Vec3};
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
#[serde(transparent)]
pub struct JunctionId(pub u32);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Encode, Decode,
)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

/// A graph vertex where segments meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub id: JunctionId,
    pub position: Vec2,
    /// Explicitly marked as an intersection by the data source, regardless
    /// of how many segments end here.
    #[serde(default)]
    pub flagged: bool,
    /// Incident segments, in segment order. Filled in by the network;
    /// whatever the description carries here is replaced on build.
    #[serde(default, skip_deserializing)]
    pub connected_segments: Vec<SegmentId>,
}

impl Junction {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id: JunctionId(id),
            position: Vec2::new(x, y),
            flagged: false,
            connected_segments: Vec::new(),
        }
    }

    pub fn flagged(mut self) -> Self {
        self.flagged = true;
        self
    }

    pub fn degree(&self) -> usize {
        self.connected_segments.len()
    }

    /// Exactly one incident segment.
    pub fn is_dead_end(&self) -> bool {
        self.degree() == 1
    }

    /// Counted as a junction in network statistics.
    pub fn is_intersection(&self) -> bool {
        self.flagged || self.degree() >= 2
    }
}

/// A single road edge: a polyline of `(x, y, elevation)` points between two
/// junctions, with a carriageway width in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub start: JunctionId,
    pub end: JunctionId,
    /// Carriageway width in meters.
    pub width: f32,
    /// `x`/`y` are planar meters, `z` is elevation in meters.
    pub polyline: Vec<Vec3>,
    /// Externally supplied elevation. Overrides the polyline minimum when set.
    #[serde(default)]
    pub elevation: Option<f32>,
}

impl Segment {
    pub fn new(id: u32, start: u32, end: u32, width: f32, polyline: Vec<Vec3>) -> Self {
        Self {
            id: SegmentId(id),
            start: JunctionId(start),
            end: JunctionId(end),
            width,
            polyline,
            elevation: None,
        }
    }

    /// Straight two-point segment at a constant elevation.
    pub fn straight(id: u32, start: u32, end: u32, width: f32, from: Vec2, to: Vec2, z: f32) -> Self {
        Self::new(id, start, end, width, vec![from.extend(z), to.extend(z)])
    }

    pub fn with_elevation(mut self, elevation: f32) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Both endpoints are the same junction.
    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }

    /// Planar arc length in meters (elevation changes are ignored).
    pub fn arc_length(&self) -> f32 {
        self.polyline
            .windows(2)
            .map(|pair| pair[0].truncate().distance(pair[1].truncate()))
            .sum()
    }

    /// Lowest point of the segment, or the supplied elevation if present.
    pub fn min_elevation(&self) -> f32 {
        if let Some(e) = self.elevation {
            return e;
        }
        self.polyline
            .iter()
            .map(|p| p.z)
            .fold(f32::INFINITY, f32::min)
    }

    /// The junction at the other end of this segment.
    pub fn other_end(&self, junction: JunctionId) -> JunctionId {
        if junction == self.start {
            self.end
        } else {
            self.start
        }
    }
}
