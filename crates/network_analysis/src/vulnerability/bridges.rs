//! Bridge finding with flood-prone counts per side.
//!
//! Iterative Tarjan discovery/low-link DFS over the CSR adjacency, started
//! from every unvisited junction so each connected component is handled on
//! its own. The parent edge is skipped by segment, not by junction, so two
//! parallel segments between the same junctions are never bridges.
//! Self-loops are ignored by the traversal; their flood flag still counts
//! towards the side their junction ends up on.
//!
//! While unwinding, every junction accumulates the flood-prone segments of
//! its DFS subtree: a tree edge is attributed to its child, a back edge to
//! its lower endpoint. For a bridge `parent -> child` the child side is the
//! child's subtree minus the bridge itself, and the parent side is the rest
//! of the component.

use std::collections::VecDeque;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::road_network::{JunctionId, RoadNetwork, SegmentId};

const UNVISITED: u32 = u32::MAX;

/// A segment whose removal disconnects its component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Bridge {
    pub segment: SegmentId,
    /// Endpoint on the DFS root's side.
    pub parent_side: JunctionId,
    /// Endpoint on the detached side.
    pub child_side: JunctionId,
    pub flood_prone_parent_side: u32,
    pub flood_prone_child_side: u32,
}

impl Bridge {
    /// A bridge is critical when losing it would cut off flood-prone road.
    pub fn is_critical(&self) -> bool {
        self.flood_prone_parent_side > 0 || self.flood_prone_child_side > 0
    }
}

struct Frame {
    junction: u32,
    /// Segment index of the tree edge that reached this junction.
    via: Option<u32>,
    next: usize,
}

/// Every bridge of `network`, ordered by segment id. `flood_prone[i]` flags
/// the segment at index `i`; missing entries count as not flood-prone.
pub fn find_bridges(network: &RoadNetwork, flood_prone: &[bool]) -> Vec<Bridge> {
    let adjacency = network.adjacency();
    let segments = network.segments();
    let junctions = network.junctions();
    let n = adjacency.junction_count();
    let flagged = |seg_idx: u32| flood_prone.get(seg_idx as usize).copied().unwrap_or(false);

    let mut self_loop_flood = vec![0u32; n];
    for (seg_idx, segment) in segments.iter().enumerate() {
        if segment.is_self_loop() && flagged(seg_idx as u32) {
            if let Some(j) = network.junction_index(segment.start) {
                self_loop_flood[j as usize] += 1;
            }
        }
    }

    let mut disc = vec![UNVISITED; n];
    let mut low = vec![0u32; n];
    let mut subtree_flood = vec![0u32; n];
    let mut timer = 0u32;
    let mut stack: Vec<Frame> = Vec::new();
    let mut bridges = Vec::new();

    for root in 0..n as u32 {
        if disc[root as usize] != UNVISITED {
            continue;
        }
        // (segment index, parent, child) found in this component.
        let mut found: Vec<(u32, u32, u32)> = Vec::new();

        disc[root as usize] = timer;
        low[root as usize] = timer;
        subtree_flood[root as usize] = self_loop_flood[root as usize];
        timer += 1;
        stack.push(Frame {
            junction: root,
            via: None,
            next: 0,
        });

        while let Some(top) = stack.len().checked_sub(1) {
            let u = stack[top].junction;
            let via = stack[top].via;
            let incident = adjacency.incident(u);

            if let Some(inc) = incident.get(stack[top].next).copied() {
                stack[top].next += 1;
                let w = inc.neighbor;
                if w == u || Some(inc.segment) == via {
                    continue;
                }
                if disc[w as usize] == UNVISITED {
                    disc[w as usize] = timer;
                    low[w as usize] = timer;
                    timer += 1;
                    subtree_flood[w as usize] =
                        self_loop_flood[w as usize] + flagged(inc.segment) as u32;
                    stack.push(Frame {
                        junction: w,
                        via: Some(inc.segment),
                        next: 0,
                    });
                } else {
                    low[u as usize] = low[u as usize].min(disc[w as usize]);
                    // Each back edge is seen from both ends; count it once,
                    // from the descendant.
                    if disc[w as usize] < disc[u as usize] && flagged(inc.segment) {
                        subtree_flood[u as usize] += 1;
                    }
                }
                continue;
            }

            stack.pop();
            if let (Some(parent), Some(seg_idx)) = (stack.last().map(|f| f.junction), via) {
                let (p, c) = (parent as usize, u as usize);
                low[p] = low[p].min(low[c]);
                subtree_flood[p] += subtree_flood[c];
                if low[c] > disc[p] {
                    found.push((seg_idx, parent, u));
                }
            }
        }

        let component_flood = subtree_flood[root as usize];
        for (seg_idx, parent, child) in found {
            let child_subtree = subtree_flood[child as usize];
            bridges.push(Bridge {
                segment: segments[seg_idx as usize].id,
                parent_side: junctions[parent as usize].id,
                child_side: junctions[child as usize].id,
                flood_prone_parent_side: component_flood - child_subtree,
                flood_prone_child_side: child_subtree - flagged(seg_idx) as u32,
            });
        }
    }

    bridges.sort_by_key(|b| b.segment);
    bridges
}

/// Number of connected components, optionally with one segment removed.
/// Isolated junctions count as components.
pub fn count_components(network: &RoadNetwork, without: Option<SegmentId>) -> usize {
    let adjacency = network.adjacency();
    let removed = without.and_then(|id| network.segment_index(id));
    let n = adjacency.junction_count();
    let mut seen = vec![false; n];
    let mut queue = VecDeque::new();
    let mut components = 0;

    for start in 0..n {
        if seen[start] {
            continue;
        }
        components += 1;
        seen[start] = true;
        queue.push_back(start as u32);
        while let Some(u) = queue.pop_front() {
            for inc in adjacency.incident(u) {
                if Some(inc.segment) == removed || seen[inc.neighbor as usize] {
                    continue;
                }
                seen[inc.neighbor as usize] = true;
                queue.push_back(inc.neighbor);
            }
        }
    }
    components
}
