//! Flood-prone tagging by relative elevation.
//!
//! The threshold is the `p`-th percentile of the current network's segment
//! elevations, using linear interpolation between closest ranks:
//! `rank = p / 100 * (n - 1)` over the ascending elevations. Segments at or
//! below the threshold are flood-prone. The percentile is network-relative;
//! nothing is normalized across networks.

use std::collections::BTreeSet;

use crate::road_network::{RoadNetwork, SegmentId};

/// Linear-interpolated percentile of ascending `sorted` values.
pub fn percentile(sorted: &[f32], p: f32) -> Option<f32> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p.clamp(0.0, 100.0) / 100.0) * last as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f32;
    if lo == hi || frac == 0.0 {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Elevation threshold and the segments at or below it.
pub fn tag_flood_prone(network: &RoadNetwork, flood_percentile: f32) -> (Option<f32>, BTreeSet<SegmentId>) {
    let mut elevations: Vec<f32> = network
        .segments()
        .iter()
        .map(|s| s.min_elevation())
        .filter(|z| z.is_finite())
        .collect();
    elevations.sort_by(f32::total_cmp);

    let Some(threshold) = percentile(&elevations, flood_percentile) else {
        return (None, BTreeSet::new());
    };
    let tagged = network
        .segments()
        .iter()
        .filter(|s| s.min_elevation() <= threshold)
        .map(|s| s.id)
        .collect();
    (Some(threshold), tagged)
}
