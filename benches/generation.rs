use criterion::{criterion_group, criterion_main, Criterion, black_box};

use settlegen::generation::{GenerationConfig, GenerationPipeline};
use settlegen::grid::{ElevationGrid, GridCoord, Mask};
use settlegen::network::{NetworkParams, build_network};
use settlegen::routing::find_path;
use settlegen::terrain::{NoiseParams, synthesize};

fn bench_synthesize_256(c: &mut Criterion) {
    let params = NoiseParams { scale: 20.0, ..Default::default() };

    c.bench_function("synthesize_256", |b| {
        b.iter(|| synthesize(black_box(256), black_box(256), &params))
    });
}

fn bench_find_path_256(c: &mut Criterion) {
    let params = NoiseParams { scale: 20.0, ..Default::default() };
    let grid = synthesize(256, 256, &params).expect("heightmap");

    c.bench_function("find_path_256_penalty_50", |b| {
        b.iter(|| {
            find_path(
                black_box(&grid),
                GridCoord::new(10, 10),
                GridCoord::new(240, 240),
                black_box(50.0),
            )
        })
    });
}

fn bench_river_network(c: &mut Criterion) {
    let elevation = ElevationGrid::from_fn(256, 256, |x, y| (x + y) as f32 / 512.0).expect("grid");
    let candidates = Mask::filled(256, 256, 1.0).expect("mask");
    let params = NetworkParams::river();

    c.bench_function("river_network_50_nodes", |b| {
        b.iter(|| build_network(black_box(&candidates), &elevation, &params, black_box(7)))
    });
}

fn bench_full_pipeline_128(c: &mut Criterion) {
    let config = GenerationConfig {
        width: 128,
        height: 128,
        primary_road: None,
        ..Default::default()
    };
    let pipeline = GenerationPipeline::new(config).expect("config");

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(10);
    group.bench_function("full_128", |b| b.iter(|| pipeline.run()));
    group.finish();
}

criterion_group!(
    benches,
    bench_synthesize_256,
    bench_find_path_256,
    bench_river_network,
    bench_full_pipeline_128,
);
criterion_main!(benches);
