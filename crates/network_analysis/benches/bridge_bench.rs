//! Benchmarks for the graph-heavy stages of a network analysis.
//!
//! Run with: cargo bench -p network_analysis --features bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use network_analysis::fixtures;
use network_analysis::vulnerability::{alternative_routes, find_bridges};
use network_analysis::{AnalysisPipeline, CancelToken, SegmentId, VulnerabilityAnalyzer};

fn bench_find_bridges(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_bridges");
    for n in [16u32, 64, 128] {
        let network = fixtures::grid_with_spurs(n, 50.0);
        assert_eq!(
            find_bridges(&network, &[]).len(),
            n as usize,
            "grid_with_spurs({n}) should have one bridge per spur"
        );
        group.bench_with_input(BenchmarkId::from_parameter(n), &network, |b, net| {
            b.iter(|| black_box(find_bridges(net, &[])));
        });
    }
    group.finish();
}

fn bench_vulnerability(c: &mut Criterion) {
    let mut group = c.benchmark_group("vulnerability_pass");
    group.sample_size(30);
    let analyzer = VulnerabilityAnalyzer::default();
    for n in [16u32, 64] {
        let network = fixtures::grid_with_spurs(n, 50.0);
        group.bench_with_input(BenchmarkId::from_parameter(n), &network, |b, net| {
            b.iter(|| black_box(analyzer.analyze(net)));
        });
    }
    group.finish();
}

fn bench_alternative_routes(c: &mut Criterion) {
    let network = fixtures::grid(64, 50.0);
    let middle = SegmentId(network.segment_count() as u32 / 2);
    assert!(
        !alternative_routes(&network, middle, 3).is_empty(),
        "grid segment {middle:?} should have a detour"
    );
    c.bench_function("alternative_routes_grid64_k3", |b| {
        b.iter(|| black_box(alternative_routes(&network, middle, 3)));
    });
}

fn bench_full_pass(c: &mut Criterion) {
    let pipeline = AnalysisPipeline::default();
    let network = fixtures::grid_with_spurs(64, 50.0);
    c.bench_function("full_pass_grid64", |b| {
        b.iter(|| black_box(pipeline.analyze(&network, &CancelToken::new())));
    });
}

criterion_group!(
    benches,
    bench_find_bridges,
    bench_vulnerability,
    bench_alternative_routes,
    bench_full_pass,
);
criterion_main!(benches);
