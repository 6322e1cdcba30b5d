use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::{Raster, RgbRaster};
use crate::fingerprint::matching::descriptor::hamming_distance;
use crate::fingerprint::matching::orb::{fast_corners, intensity_centroid_angle};
use crate::fingerprint::analysis::{MinutiaKind, MinutiaPoint};
use crate::fingerprint::matching::secondary::{drop_crowded, prune_spurs, skeleton_minutiae, thin};
use crate::fingerprint::matching::{
    DescriptorMatcher, Feature, FeatureDetector, Keypoint, MatchResult, MatchingConfig, MatchingEngine,
    MinutiaeTopologyMatcher, OrbDetector, SecondaryMatcher, VisualizationRefs, primary_score,
};
use crate::fingerprint::store::{ArtifactKind, ArtifactRef, ArtifactStore, MemoryArtifactStore};
use crate::fingerprint::test_utils::{broken_ridges, noise_raster, textured_raster};

struct FailingStore;

impl ArtifactStore for FailingStore {
    fn store(&self, _ctx: &RequestContext, _kind: ArtifactKind, _image: &RgbRaster) -> Result<ArtifactRef> {
        Err(FingerprintError::ArtifactStore("disk full".into()))
    }
}

fn feature(descriptor: [u8; 32]) -> Feature {
    Feature {
        keypoint: Keypoint { x: 10.0, y: 10.0, angle: 0.0, response: 1.0, octave: 0 },
        descriptor,
    }
}

fn with_bits(bits: usize) -> [u8; 32] {
    let mut d = [0u8; 32];
    for bit in 0..bits {
        d[bit / 8] |= 1 << (bit % 8);
    }
    d
}

fn square(size: u32, from: u32, to: u32) -> image::GrayImage {
    image::GrayImage::from_fn(size, size, |x, y| {
        let inside = (from..to).contains(&x) && (from..to).contains(&y);
        image::Luma([if inside { 220 } else { 30 }])
    })
}

#[test]
fn test_self_match_scores_near_full() {
    let raster = textured_raster(128, 128, 7);
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let store = MemoryArtifactStore::new();
    let result = engine.compare(&raster, &raster, &store, &RequestContext::new());

    assert!(result.keypoint_count_a() > 0);
    assert_eq!(result.keypoint_count_a(), result.keypoint_count_b());
    assert!(result.primary_score() >= 90.0, "primary {}", result.primary_score());
    assert!(result.good_match_count() as f64 >= 0.9 * result.keypoint_count_a() as f64);
}

#[test]
fn test_engine_reports_secondary_self_match() {
    let raster = broken_ridges(128, 128, 3, 0, 0);
    let engine = MatchingEngine::new(MatchingConfig::builder().render_visualizations(false).build()).unwrap();
    let result = engine.compare(&raster, &raster, &MemoryArtifactStore::new(), &RequestContext::new());

    assert_eq!(result.secondary_score(), 100.0);
}

#[test]
fn test_independent_noise_scores_near_zero() {
    let a = noise_raster(128, 128, 1);
    let b = noise_raster(128, 128, 2);
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let result = engine.compare(&a, &b, &MemoryArtifactStore::new(), &RequestContext::new());

    assert!(result.primary_score() < 5.0, "primary {}", result.primary_score());
    assert!(result.good_match_count() <= result.keypoint_count_a().min(result.keypoint_count_b()));
}

#[test]
fn test_flat_raster_is_unmatchable_not_an_error() {
    let flat = Raster::filled(64, 64, 128).unwrap();
    let textured = textured_raster(64, 64, 3);
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let result = engine.compare(&flat, &textured, &MemoryArtifactStore::new(), &RequestContext::new());

    assert_eq!(result.keypoint_count_a(), 0);
    assert_eq!(result.good_match_count(), 0);
    assert_eq!(result.primary_score(), 0.0);
    assert_eq!(result.secondary_score(), 0.0);
}

#[test]
fn test_visualizations_are_stored_per_request() {
    let raster = textured_raster(96, 96, 4);
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let store = MemoryArtifactStore::new();
    let first = engine.compare(&raster, &raster, &store, &RequestContext::new());
    let second = engine.compare(&raster, &raster, &store, &RequestContext::new());

    assert_eq!(store.len(), 6);
    let overlay = first.visualization_refs().match_overlay.clone().unwrap();
    assert_ne!(Some(overlay.clone()), second.visualization_refs().match_overlay);

    let render = store.get(&overlay).unwrap();
    assert_eq!(render.width(), 192);
    assert_eq!(render.height(), 96);
    let minutiae = store.get(first.visualization_refs().minutiae_a.as_ref().unwrap()).unwrap();
    assert_eq!((minutiae.width(), minutiae.height()), (96, 96));
}

#[test]
fn test_store_failure_keeps_scores() {
    let raster = textured_raster(96, 96, 5);
    let engine = MatchingEngine::new(MatchingConfig::default()).unwrap();
    let stored = engine.compare(&raster, &raster, &MemoryArtifactStore::new(), &RequestContext::new());
    let failed = engine.compare(&raster, &raster, &FailingStore, &RequestContext::new());

    assert_eq!(failed.visualization_refs(), &VisualizationRefs::default());
    assert_eq!(failed.primary_score(), stored.primary_score());
    assert_eq!(failed.secondary_score(), stored.secondary_score());
    assert_eq!(failed.good_match_count(), stored.good_match_count());
}

#[test]
fn test_rendering_can_be_disabled() {
    let raster = textured_raster(64, 64, 6);
    let config = MatchingConfig::builder().render_visualizations(false).build();
    let engine = MatchingEngine::new(config).unwrap();
    let store = MemoryArtifactStore::new();
    let result = engine.compare(&raster, &raster, &store, &RequestContext::new());

    assert!(store.is_empty());
    assert!(result.visualization_refs().match_overlay.is_none());
}

#[test]
fn test_match_result_enforces_bounds() {
    let result = MatchResult::new(150.0, -5.0, 10, 4, 9, VisualizationRefs::default());
    assert_eq!(result.primary_score(), 100.0);
    assert_eq!(result.secondary_score(), 0.0);
    assert_eq!(result.good_match_count(), 4);

    let nan = MatchResult::new(f64::NAN, f64::NAN, 3, 3, 1, VisualizationRefs::default());
    assert_eq!(nan.primary_score(), 0.0);
    assert_eq!(nan.secondary_score(), 0.0);
}

#[test]
fn test_unmatchable_result_keeps_counts_and_secondary() {
    let result = MatchResult::unmatchable(0, 17, 42.5);
    assert_eq!(result.primary_score(), 0.0);
    assert_eq!(result.secondary_score(), 42.5);
    assert_eq!((result.keypoint_count_a(), result.keypoint_count_b()), (0, 17));
    assert_eq!(result.good_match_count(), 0);
    assert_eq!(result.visualization_refs(), &VisualizationRefs::default());
}

#[test]
fn test_primary_score() {
    assert_eq!(primary_score(0, 0, 10), 0.0);
    assert_eq!(primary_score(3, 10, 0), 0.0);
    assert_eq!(primary_score(5, 10, 20), 50.0);
    assert_eq!(primary_score(12, 10, 20), 100.0);
}

#[test]
fn test_hamming_distance() {
    assert_eq!(hamming_distance(&[0; 32], &[0; 32]), 0);
    assert_eq!(hamming_distance(&[0; 32], &[0xFF; 32]), 256);
    assert_eq!(hamming_distance(&with_bits(5), &with_bits(12)), 7);
}

#[test]
fn test_ratio_test_rejects_ambiguous_neighbours() {
    let matcher = DescriptorMatcher::new(0.75, 64);
    let query = [feature([0; 32])];

    let clear = [feature(with_bits(1)), feature(with_bits(2))];
    let matches = matcher.match_features(&query, &clear);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].train_idx, 0);
    assert_eq!(matches[0].distance, 1);

    let mut other = with_bits(1);
    other[0] = 0b10;
    let ambiguous = [feature(with_bits(1)), feature(other)];
    assert!(matcher.match_features(&query, &ambiguous).is_empty());
}

#[test]
fn test_matches_are_one_to_one_and_gated() {
    let matcher = DescriptorMatcher::new(0.75, 64);
    let query = [feature([0; 32]), feature(with_bits(1))];
    let train = [feature([0; 32]), feature([0xFF; 32])];

    let matches = matcher.match_features(&query, &train);
    assert_eq!(matches.len(), 1);
    assert_eq!((matches[0].query_idx, matches[0].train_idx, matches[0].distance), (0, 0, 0));

    let far = [feature([0xFF; 32])];
    assert!(matcher.match_features(&query, &far).is_empty());
    assert!(matcher.match_features(&[], &train).is_empty());
}

#[test]
fn test_fast_finds_square_corners() {
    let image = square(64, 20, 44);
    let corners = fast_corners(&image, 20, 3);
    let expected = [(20, 20), (43, 20), (20, 43), (43, 43)];

    assert!(!corners.is_empty());
    for &(x, y, score) in &corners {
        assert!(score > 0.0);
        assert!(
            expected.iter().any(|&(ex, ey)| (x - ex).abs() <= 3 && (y - ey).abs() <= 3),
            "unexpected corner at ({}, {})",
            x,
            y
        );
    }
    for (ex, ey) in expected {
        assert!(corners.iter().any(|&(x, y, _)| (x - ex).abs() <= 3 && (y - ey).abs() <= 3));
    }
}

#[test]
fn test_orientation_points_towards_bright_side() {
    let image = image::GrayImage::from_fn(64, 64, |x, _| image::Luma([if x >= 32 { 200 } else { 10 }]));
    assert!(intensity_centroid_angle(&image, 32, 32, 5).abs() < 1e-6);
}

#[test]
fn test_detection_is_deterministic_and_bounded() {
    let raster = textured_raster(128, 96, 9);
    let detector = OrbDetector::new(MatchingConfig::builder().max_keypoints(40).build());
    let first = detector.detect(&raster);
    let second = detector.detect(&raster);

    assert_eq!(first, second);
    assert!(!first.is_empty() && first.len() <= 40);
    for f in &first {
        assert!(f.keypoint.x >= 0.0 && f.keypoint.x < 128.0);
        assert!(f.keypoint.y >= 0.0 && f.keypoint.y < 96.0);
    }
    for pair in first.windows(2) {
        assert!(pair[0].keypoint.response >= pair[1].keypoint.response);
    }
}

#[test]
fn test_thinning_leaves_single_pixel_ridge() {
    let (w, h) = (60, 24);
    let mut grid: Vec<u8> = (0..w * h)
        .map(|i| {
            let (x, y) = (i % w, i / w);
            u8::from((10..50).contains(&x) && (9..14).contains(&y))
        })
        .collect();
    thin(&mut grid, w, h);

    for x in 20..40 {
        let column: usize = (0..h).map(|y| grid[y * w + x] as usize).sum();
        assert_eq!(column, 1, "column {} not thinned to one pixel", x);
    }
}

#[test]
fn test_skeleton_minutiae_on_bar() {
    let data = (0..60 * 24)
        .map(|i| {
            let (x, y) = (i % 60, i / 60);
            if (10..50).contains(&x) && (9..14).contains(&y) { 240 } else { 20 }
        })
        .collect();
    let bar = Raster::new(60, 24, data).unwrap();
    let minutiae = skeleton_minutiae(&bar, 5, 6);

    assert_eq!(minutiae.len(), 2, "{:?}", minutiae);
    for p in &minutiae {
        assert_eq!(p.kind, MinutiaKind::Ending);
        assert!((5..55).contains(&p.x) && (5..19).contains(&p.y));
    }
}

#[test]
fn test_spur_pruning_removes_short_branch() {
    let (w, h) = (60, 20);
    let mut grid = vec![0u8; w * h];
    for x in 10..50 {
        grid[10 * w + x] = 1;
    }
    for y in 7..10 {
        grid[y * w + 30] = 1;
    }
    prune_spurs(&mut grid, w, h, 1, 6);

    for y in 7..10 {
        assert_eq!(grid[y * w + 30], 0, "spur pixel left at y={}", y);
    }
    let row: Vec<usize> = (0..w).filter(|&x| grid[10 * w + x] == 1).collect();
    assert_eq!(row, (16..44).collect::<Vec<_>>());
}

#[test]
fn test_crowded_minutiae_are_dropped() {
    let points = [
        MinutiaPoint { x: 10, y: 10, kind: MinutiaKind::Ending },
        MinutiaPoint { x: 13, y: 10, kind: MinutiaKind::Bifurcation },
        MinutiaPoint { x: 40, y: 40, kind: MinutiaKind::Ending },
    ];
    assert_eq!(drop_crowded(&points, 6.0), vec![points[2]]);
}

#[test]
fn test_minutiae_are_spaced_and_capped() {
    let raster = broken_ridges(400, 400, 8, 0, 0);
    let matcher = MinutiaeTopologyMatcher::default();
    let minutiae: Vec<MinutiaPoint> = matcher.minutiae(&raster).iter().copied().collect();

    assert_eq!(minutiae.len(), matcher.max_minutiae());
    for (i, p) in minutiae.iter().enumerate() {
        for q in &minutiae[i + 1..] {
            let d = ((p.x - q.x) as f64).hypot((p.y - q.y) as f64);
            assert!(d >= matcher.min_spacing(), "{:?} and {:?} are {} apart", p, q, d);
        }
    }
    assert_eq!(matcher.similarity(&raster, &raster), 100.0);
}

#[test]
fn test_secondary_self_similarity() {
    let raster = broken_ridges(96, 96, 12, 0, 0);
    let matcher = MinutiaeTopologyMatcher::default();
    assert!(!matcher.minutiae(&raster).is_empty());
    assert_eq!(matcher.similarity(&raster, &raster), 100.0);
    assert_eq!(matcher.name(), "minutiae-topology");
}

#[test]
fn test_secondary_tracks_shifted_copy() {
    let a = broken_ridges(128, 128, 21, 0, 0);
    let b = broken_ridges(128, 128, 21, 5, 3);
    let score = MinutiaeTopologyMatcher::default().similarity(&a, &b);
    assert!(score > 50.0, "shifted copy scored {}", score);
}

#[test]
fn test_secondary_unrelated_inputs_score_low() {
    let matcher = MinutiaeTopologyMatcher::default();
    let pairs = [
        (noise_raster(128, 128, 1), noise_raster(128, 128, 2)),
        (textured_raster(96, 96, 12), textured_raster(96, 96, 13)),
        (textured_raster(128, 128, 30), textured_raster(128, 128, 31)),
    ];
    for (i, (a, b)) in pairs.iter().enumerate() {
        let score = matcher.similarity(a, b);
        assert!(score < 30.0, "pair {} scored {}", i, score);
    }
}

#[test]
fn test_config_builder_sets_every_field() {
    let config = MatchingConfig::builder()
        .fast_threshold(30)
        .max_keypoints(200)
        .pyramid(3, 1.5)
        .descriptor_radii(11, 12)
        .ratio_threshold(0.8)
        .max_hamming_distance(50)
        .pattern_seed(9)
        .secondary_tolerance(5.0)
        .secondary_bin_size(2.5)
        .render_visualizations(false)
        .build();

    let expected = MatchingConfig {
        fast_threshold: 30,
        max_keypoints: 200,
        pyramid_levels: 3,
        scale_factor: 1.5,
        patch_radius: 11,
        orientation_radius: 12,
        ratio_threshold: 0.8,
        max_hamming_distance: 50,
        pattern_seed: 9,
        secondary_tolerance: 5.0,
        secondary_bin_size: 2.5,
        render_visualizations: false,
    };
    assert_eq!(config, expected);
    assert_eq!(MatchingConfig::builder().build(), MatchingConfig::default());
}

#[test]
fn test_invalid_config_rejected() {
    let config = MatchingConfig::builder().pyramid(4, 1.0).build();
    assert!(matches!(MatchingEngine::new(config), Err(FingerprintError::InvalidConfig(_))));
}
