//! Unit tests for network construction, validation and the cached adjacency.

use bevy::math::{Vec2, Vec3};

use crate::error::{AnalysisError, NetworkDefect};
use crate::fixtures;

use super::*;

fn junctions(n: u32) -> Vec<Junction> {
    (0..n).map(|i| Junction::new(i, i as f32 * 100.0, 0.0)).collect()
}

// ====================================================================
// Construction and validation
// ====================================================================

#[test]
fn test_build_sorts_and_connects() {
    let segments = vec![
        Segment::straight(7, 1, 2, 7.0, Vec2::new(100.0, 0.0), Vec2::new(200.0, 0.0), 1.0),
        Segment::straight(3, 0, 1, 7.0, Vec2::ZERO, Vec2::new(100.0, 0.0), 1.0),
    ];
    let net = RoadNetwork::build(segments, junctions(3)).unwrap();

    let ids: Vec<u32> = net.segments().iter().map(|s| s.id.0).collect();
    assert_eq!(ids, vec![3, 7]);

    let middle = net.junction(JunctionId(1)).unwrap();
    assert_eq!(middle.connected_segments, vec![SegmentId(3), SegmentId(7)]);
    assert!(middle.is_intersection());
    assert!(net.junction(JunctionId(0)).unwrap().is_dead_end());
}

#[test]
fn test_dangling_junction_rejected() {
    let segments = vec![Segment::straight(
        1,
        0,
        42,
        7.0,
        Vec2::ZERO,
        Vec2::new(10.0, 0.0),
        0.0,
    )];
    let err = RoadNetwork::build(segments, junctions(2)).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::MalformedNetwork(NetworkDefect::DanglingJunction {
            segment: SegmentId(1),
            junction: JunctionId(42),
        })
    );
}

#[test]
fn test_single_point_polyline_rejected() {
    let segments = vec![Segment::new(1, 0, 1, 7.0, vec![Vec3::ZERO])];
    let err = RoadNetwork::build(segments, junctions(2)).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::MalformedNetwork(NetworkDefect::DegeneratePolyline { points: 1, .. })
    ));
}

#[test]
fn test_nan_geometry_rejected() {
    let segments = vec![Segment::new(
        1,
        0,
        1,
        7.0,
        vec![Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0)],
    )];
    let err = RoadNetwork::build(segments, junctions(2)).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::MalformedNetwork(NetworkDefect::NonFiniteGeometry { .. })
    ));
}

#[test]
fn test_duplicate_ids_rejected() {
    let seg = Segment::straight(1, 0, 1, 7.0, Vec2::ZERO, Vec2::X, 0.0);
    let err = RoadNetwork::build(vec![seg.clone(), seg], junctions(2)).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::MalformedNetwork(NetworkDefect::DuplicateSegment(SegmentId(1)))
    ));

    let mut js = junctions(2);
    js.push(Junction::new(0, 5.0, 5.0));
    let err = RoadNetwork::build(Vec::new(), js).unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::MalformedNetwork(NetworkDefect::DuplicateJunction(JunctionId(0)))
    ));
}

#[test]
fn test_non_positive_width_is_not_a_graph_defect() {
    let segments = vec![Segment::straight(1, 0, 1, 0.0, Vec2::ZERO, Vec2::X, 0.0)];
    assert!(RoadNetwork::build(segments, junctions(2)).is_ok());
}

#[test]
fn test_empty_network() {
    let net = RoadNetwork::build(Vec::new(), Vec::new()).unwrap();
    assert!(net.is_empty());
    assert_eq!(net.adjacency().junction_count(), 0);
}

// ====================================================================
// Geometry
// ====================================================================

#[test]
fn test_arc_length_ignores_elevation() {
    let seg = Segment::new(
        1,
        0,
        1,
        7.0,
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 4.0, 50.0),
            Vec3::new(3.0, 10.0, 10.0),
        ],
    );
    assert!((seg.arc_length() - 11.0).abs() < 1e-5);
}

#[test]
fn test_min_elevation_and_override() {
    let seg = Segment::new(
        1,
        0,
        1,
        7.0,
        vec![Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 2.5)],
    );
    assert!((seg.min_elevation() - 2.5).abs() < f32::EPSILON);
    let seg = seg.with_elevation(-1.0);
    assert!((seg.min_elevation() + 1.0).abs() < f32::EPSILON);
}

// ====================================================================
// Adjacency cache
// ====================================================================

#[test]
fn test_adjacency_lists_incident_segments() {
    let net = fixtures::two_triangles();
    let adj = net.adjacency();
    assert_eq!(adj.junction_count(), 6);

    // Junction 2 touches both triangle edges and the joining segment.
    let idx = net.junction_index(JunctionId(2)).unwrap();
    let mut ids: Vec<u32> = adj
        .incident_segments(idx, net.segments())
        .map(|s| s.0)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3, 7]);
}

#[test]
fn test_self_loop_appears_once() {
    let segments = vec![
        Segment::straight(1, 0, 1, 7.0, Vec2::ZERO, Vec2::X, 0.0),
        Segment::new(
            2,
            1,
            1,
            7.0,
            vec![Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::X],
        ),
    ];
    let net = RoadNetwork::build(segments, junctions(2)).unwrap();
    let idx = net.junction_index(JunctionId(1)).unwrap();
    assert_eq!(net.adjacency().incident(idx).len(), 2);
    assert_eq!(net.junction(JunctionId(1)).unwrap().degree(), 2);
}

#[test]
fn test_mutation_invalidates_adjacency() {
    let mut net = fixtures::path_abc();
    let c = net.junction_index(JunctionId(2)).unwrap();
    assert_eq!(net.adjacency().incident(c).len(), 1);

    net.insert_segment(Segment::straight(
        9,
        0,
        2,
        7.0,
        Vec2::ZERO,
        Vec2::new(200.0, 0.0),
        0.0,
    ))
    .unwrap();
    assert_eq!(net.adjacency().incident(c).len(), 2);
    assert_eq!(net.junction(JunctionId(2)).unwrap().degree(), 2);

    let removed = net.remove_segment(SegmentId(9)).unwrap();
    assert_eq!(removed.id, SegmentId(9));
    assert_eq!(net.adjacency().incident(c).len(), 1);
    assert!(net.remove_segment(SegmentId(9)).is_none());
}

#[test]
fn test_rejected_insert_leaves_network_unchanged() {
    let mut net = fixtures::path_abc();
    let before = net.fingerprint();
    let err = net
        .insert_segment(Segment::straight(9, 0, 77, 7.0, Vec2::ZERO, Vec2::X, 0.0))
        .unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedNetwork(_)));
    assert_eq!(net.fingerprint(), before);
    assert_eq!(net.segment_count(), 2);
}

// ====================================================================
// Fingerprint and description
// ====================================================================

#[test]
fn test_fingerprint_tracks_changes() {
    let a = fixtures::two_triangles();
    let b = fixtures::two_triangles();
    assert_eq!(a.fingerprint(), b.fingerprint());

    let mut c = fixtures::two_triangles();
    c.remove_segment(SegmentId(1));
    assert_ne!(a.fingerprint(), c.fingerprint());
}

#[test]
fn test_description_from_json() {
    let json = r#"{
        "name": "Test Town",
        "junctions": [
            {"id": 1, "position": [0.0, 0.0]},
            {"id": 2, "position": [100.0, 0.0], "flagged": true}
        ],
        "segments": [
            {"id": 10, "start": 1, "end": 2, "width": 9.0,
             "polyline": [[0.0, 0.0, 4.0], [100.0, 0.0, 3.0]]}
        ]
    }"#;
    let desc: RoadNetworkDescription = serde_json::from_str(json).unwrap();
    let net = desc.into_network().unwrap();
    assert_eq!(net.name(), "Test Town");
    assert_eq!(net.segment_count(), 1);
    assert!(net.junction(JunctionId(2)).unwrap().flagged);
    assert!((net.segments()[0].arc_length() - 100.0).abs() < 1e-4);
}
