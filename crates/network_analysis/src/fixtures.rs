//! Small hand-built networks shared by unit tests and benchmarks.

use bevy::math::Vec2;

use crate::road_network::{Junction, RoadNetwork, Segment};

fn build(segments: Vec<Segment>, junctions: Vec<Junction>, name: &str) -> RoadNetwork {
    match RoadNetwork::build(segments, junctions) {
        Ok(net) => net.with_name(name),
        Err(e) => panic!("fixture {name} is malformed: {e}"),
    }
}

fn seg(id: u32, a: &Junction, b: &Junction, width: f32, z: f32) -> Segment {
    Segment::straight(id, a.id.0, b.id.0, width, a.position, b.position, z)
}

/// Two triangles joined by a single segment (id 7, junction 2 to 3).
///
/// ```text
///   1           4
///   | \       / |
///   |  2 --- 3  |
///   | /       \ |
///   0           5
/// ```
///
/// The left triangle sits low (elevations 1, 2, 3), the bridge at 6 and the
/// right triangle high (8, 9, 10). Widths cover all four width bands.
pub fn two_triangles() -> RoadNetwork {
    let j: Vec<Junction> = vec![
        Junction::new(0, 0.0, 0.0),
        Junction::new(1, 0.0, 200.0),
        Junction::new(2, 150.0, 100.0),
        Junction::new(3, 450.0, 100.0),
        Junction::new(4, 600.0, 200.0),
        Junction::new(5, 600.0, 0.0),
    ];
    let segments = vec![
        seg(1, &j[0], &j[1], 5.0, 1.0),
        seg(2, &j[1], &j[2], 6.5, 2.0),
        seg(3, &j[2], &j[0], 9.0, 3.0),
        seg(7, &j[2], &j[3], 15.0, 6.0),
        seg(4, &j[3], &j[4], 11.0, 8.0),
        seg(5, &j[4], &j[5], 7.5, 9.0),
        seg(6, &j[5], &j[3], 12.5, 10.0),
    ];
    build(segments, j, "two_triangles")
}

/// Simple path A(0) - B(1) - C(2): segment 1 is A-B, segment 2 is B-C.
pub fn path_abc() -> RoadNetwork {
    let j = vec![
        Junction::new(0, 0.0, 0.0),
        Junction::new(1, 100.0, 0.0),
        Junction::new(2, 200.0, 0.0),
    ];
    let segments = vec![seg(1, &j[0], &j[1], 7.0, 3.0), seg(2, &j[1], &j[2], 7.0, 1.0)];
    build(segments, j, "path_abc")
}

/// A chain of segments with the given elevations, segment ids starting at 1.
pub fn chain_with_elevations(elevations: &[f32]) -> RoadNetwork {
    let j: Vec<Junction> = (0..=elevations.len() as u32)
        .map(|i| Junction::new(i, i as f32 * 100.0, 0.0))
        .collect();
    let segments = elevations
        .iter()
        .enumerate()
        .map(|(i, &z)| seg(i as u32 + 1, &j[i], &j[i + 1], 7.0, z))
        .collect();
    build(segments, j, "chain")
}

/// A unit square 0-1-2-3 (segments 1..=4) with a diagonal 0-2 (segment 5).
/// No bridges; several disjoint routes between any two corners.
pub fn square_with_diagonal() -> RoadNetwork {
    let j = vec![
        Junction::new(0, 0.0, 0.0),
        Junction::new(1, 100.0, 0.0),
        Junction::new(2, 100.0, 100.0),
        Junction::new(3, 0.0, 100.0),
    ];
    let segments = vec![
        seg(1, &j[0], &j[1], 7.0, 1.0),
        seg(2, &j[1], &j[2], 7.0, 2.0),
        seg(3, &j[2], &j[3], 7.0, 3.0),
        seg(4, &j[3], &j[0], 7.0, 4.0),
        seg(5, &j[0], &j[2], 7.0, 5.0),
    ];
    build(segments, j, "square_with_diagonal")
}

/// `n` x `n` street grid with `spacing` meters between junctions.
/// Elevation rises towards the north-east corner.
pub fn grid(n: u32, spacing: f32) -> RoadNetwork {
    let mut junctions = Vec::with_capacity((n * n) as usize);
    for y in 0..n {
        for x in 0..n {
            junctions.push(Junction::new(y * n + x, x as f32 * spacing, y as f32 * spacing));
        }
    }
    let mut segments = Vec::new();
    let mut next_id = 0;
    for y in 0..n {
        for x in 0..n {
            let here = &junctions[(y * n + x) as usize];
            let z = (x + y) as f32;
            let width = if y % 4 == 0 { 10.0 } else { 6.0 };
            if x + 1 < n {
                let east = &junctions[(y * n + x + 1) as usize];
                segments.push(seg(next_id, here, east, width, z));
                next_id += 1;
            }
            if y + 1 < n {
                let north = &junctions[((y + 1) * n + x) as usize];
                segments.push(seg(next_id, here, north, 7.0, z));
                next_id += 1;
            }
        }
    }
    build(segments, junctions, "grid")
}

/// A grid with a dead-end spur hanging off every junction on the west edge.
pub fn grid_with_spurs(n: u32, spacing: f32) -> RoadNetwork {
    let base = grid(n, spacing);
    let base_junction = n * n;
    let base_segment = base.segments().iter().map(|s| s.id.0 + 1).max().unwrap_or(0);
    let mut junctions: Vec<Junction> = base.junctions().to_vec();
    let mut segments: Vec<Segment> = base.segments().to_vec();
    for y in 0..n {
        let anchor = junctions[(y * n) as usize].clone();
        let spur = Junction::new(base_junction + y, -spacing, anchor.position.y);
        segments.push(Segment::straight(
            base_segment + y,
            anchor.id.0,
            spur.id.0,
            5.0,
            anchor.position,
            Vec2::new(-spacing, anchor.position.y),
            0.0,
        ));
        junctions.push(spur);
    }
    build(segments, junctions, "grid_with_spurs")
}
