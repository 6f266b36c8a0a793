//! Edge-disjoint alternative routes around a removed segment.
//!
//! Dijkstra over junction indices with the removed segment excluded. Each
//! route found has its segments excluded too before the next search, so
//! the returned routes share no segment with each other or with the removed
//! one. Costs are planar lengths in whole centimeters with a floor of one,
//! which degrades to hop counting when geometry carries no length.

use bevy::log::info;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::road_network::{Adjacency, RoadNetwork, SegmentId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct AlternativeRoute {
    /// Segments in travel order from the removed segment's start junction
    /// to its end junction.
    pub segments: Vec<SegmentId>,
    pub length_m: f32,
}

/// Whole centimeters, at least 1. Each cost is capped at `u32::MAX` and
/// summed as `u64`, so no path total can overflow.
fn segment_cost(network: &RoadNetwork, seg_idx: u32) -> u64 {
    let length = network.segments()[seg_idx as usize].arc_length() as f64;
    ((length * 100.0).round().min(u32::MAX as f64) as u64).max(1)
}

/// Cheapest usable segment between two adjacent junctions.
fn cheapest_link(
    adjacency: &Adjacency,
    costs: &[u64],
    excluded: &[bool],
    from: u32,
    to: u32,
) -> Option<u32> {
    adjacency
        .incident(from)
        .iter()
        .filter(|inc| inc.neighbor == to && !excluded[inc.segment as usize])
        .min_by_key(|inc| (costs[inc.segment as usize], inc.segment))
        .map(|inc| inc.segment)
}

/// Up to `max_routes` edge-disjoint routes between the endpoints of
/// `removed`, cheapest first. Empty when the endpoints are disconnected
/// without it, when `removed` is a self-loop or unknown, or when
/// `max_routes` is zero.
pub fn alternative_routes(
    network: &RoadNetwork,
    removed: SegmentId,
    max_routes: usize,
) -> Vec<AlternativeRoute> {
    let Some(removed_idx) = network.segment_index(removed) else {
        return Vec::new();
    };
    let segment = &network.segments()[removed_idx as usize];
    let (Some(start), Some(goal)) = (
        network.junction_index(segment.start),
        network.junction_index(segment.end),
    ) else {
        return Vec::new();
    };
    if start == goal {
        return Vec::new();
    }

    let adjacency = network.adjacency();
    let costs: Vec<u64> = (0..network.segment_count() as u32)
        .map(|i| segment_cost(network, i))
        .collect();
    let mut excluded = vec![false; network.segment_count()];
    excluded[removed_idx as usize] = true;

    let mut routes = Vec::new();
    while routes.len() < max_routes {
        let found = pathfinding::prelude::dijkstra(
            &start,
            |&u| {
                adjacency
                    .incident(u)
                    .iter()
                    .filter(|inc| inc.neighbor != u && !excluded[inc.segment as usize])
                    .map(|inc| (inc.neighbor, costs[inc.segment as usize]))
                    .collect::<Vec<_>>()
            },
            |&u| u == goal,
        );
        let Some((junctions, _cost)) = found else {
            break;
        };

        let mut segments = Vec::with_capacity(junctions.len().saturating_sub(1));
        let mut length_m = 0.0;
        for pair in junctions.windows(2) {
            let Some(seg_idx) = cheapest_link(adjacency, &costs, &excluded, pair[0], pair[1])
            else {
                break;
            };
            excluded[seg_idx as usize] = true;
            let seg = &network.segments()[seg_idx as usize];
            length_m += seg.arc_length();
            segments.push(seg.id);
        }
        routes.push(AlternativeRoute { segments, length_m });
    }

    if routes.is_empty() && max_routes > 0 {
        info!(
            "No alternative route around segment {} in '{}'",
            removed.0,
            network.name()
        );
    }
    routes
}
