use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fingerprint_compare::fingerprint::matching::{
    FeatureDetector, MinutiaeTopologyMatcher, OrbDetector, SecondaryMatcher,
};
use fingerprint_compare::fingerprint::{
    ComparisonConfig, ComparisonPipeline, FingerprintEnhancer, MatchInput, MatchingConfig,
    MatchingEngine, MemoryArtifactStore, Raster, RequestContext,
};

fn generate_ridges(width: usize, height: usize, period: f64) -> Raster {
    let (cx, cy) = (width as f64 * 0.45, height as f64 * 0.55);
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = ((i % width) as f64, (i / width) as f64);
            let r = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            (128.0 + 90.0 * (2.0 * std::f64::consts::PI * r / period).cos()) as u8
        })
        .collect();
    Raster::new(width, height, data).unwrap()
}

fn benchmark_enhancement_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("enhancement_by_size");
    group.sample_size(10);

    for size in [64usize, 128, 256] {
        let raster = generate_ridges(size, size, 9.0);
        let enhancer = FingerprintEnhancer::default();
        group.bench_with_input(BenchmarkId::from_parameter(size), &raster, |b, raster| {
            b.iter(|| enhancer.enhance(black_box(raster)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_detection(c: &mut Criterion) {
    let raster = generate_ridges(256, 256, 9.0);
    let detector = OrbDetector::default();
    c.bench_function("orb_detect_256", |b| b.iter(|| detector.detect(black_box(&raster))));
}

fn benchmark_matching(c: &mut Criterion) {
    let a = generate_ridges(256, 256, 9.0);
    let b_raster = generate_ridges(256, 256, 10.0);
    let config = MatchingConfig::builder().render_visualizations(false).build();
    let engine = MatchingEngine::new(config).unwrap();
    let store = MemoryArtifactStore::new();

    c.bench_function("match_256", |b| {
        b.iter(|| engine.compare(black_box(&a), black_box(&b_raster), &store, &RequestContext::new()))
    });
}

fn benchmark_secondary_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("secondary_by_size");
    group.sample_size(10);
    let matcher = MinutiaeTopologyMatcher::default();

    for size in [128usize, 256, 512] {
        let a = generate_ridges(size, size, 9.0);
        let b_raster = generate_ridges(size, size, 10.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &(a, b_raster), |b, (a, b_raster)| {
            b.iter(|| matcher.similarity(black_box(a), black_box(b_raster)));
        });
    }

    group.finish();
}

fn benchmark_full_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_comparison");
    group.sample_size(10);
    let a = generate_ridges(128, 128, 9.0);
    let b_raster = generate_ridges(128, 128, 10.0);

    for (input, label) in [(MatchInput::Raw, "raw"), (MatchInput::Enhanced, "enhanced")] {
        let config = ComparisonConfig::builder().match_input(input).build();
        let pipeline = ComparisonPipeline::new(config, MemoryArtifactStore::new()).unwrap();
        group.bench_function(label, |b| b.iter(|| pipeline.compare(black_box(&a), black_box(&b_raster)).unwrap()));
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_enhancement_sizes,
    benchmark_detection,
    benchmark_matching,
    benchmark_secondary_sizes,
    benchmark_full_comparison
);
criterion_main!(benches);
