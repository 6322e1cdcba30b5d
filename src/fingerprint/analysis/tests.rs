use crate::fingerprint::analysis::minutiae::{adaptive_threshold, good_features};
use crate::fingerprint::analysis::pattern::{SpectrumStats, classify, classify_pattern};
use crate::fingerprint::analysis::quality::quality_score;
use crate::fingerprint::analysis::{
    AnalysisConfig, MinutiaKind, MinutiaPoint, MinutiaeSet, PatternAnalyzer, PatternClass, QualityScore,
    RidgeMetrics, Statistics,
};
use crate::fingerprint::common::error::FingerprintError;
use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::test_utils::{noise_raster, ridge_pattern};

fn square(size: usize, from: usize, to: usize) -> Raster {
    let data = (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            if (from..to).contains(&x) && (from..to).contains(&y) { 255 } else { 0 }
        })
        .collect();
    Raster::new(size, size, data).unwrap()
}

#[test]
fn test_uniform_gray_scores_zero_with_no_minutiae() {
    let gray = Raster::filled(256, 256, 128).unwrap();
    let result = PatternAnalyzer::default().analyze(&gray).unwrap();

    assert_eq!(result.quality().value(), 0.0);
    assert_eq!(result.statistics().total_minutiae(), 0);
    assert_eq!(result.ridge_metrics().ridge_count, 0.0);
    assert_eq!(result.ridge_metrics().orientation_variance, 0.0);
    assert_eq!(result.pattern(), PatternClass::Loop);
}

#[test]
fn test_statistics_match_minutiae() {
    let raster = ridge_pattern(96, 96, 9.0, 128.0, 60.0);
    let result = PatternAnalyzer::default().analyze(&raster).unwrap();
    let stats = result.statistics();

    assert_eq!(
        stats.total_minutiae(),
        stats.ending_count() + stats.bifurcation_count() + stats.crossing_count()
    );
    assert_eq!(stats.total_minutiae(), result.minutiae().len());
    assert_eq!(stats.crossing_count(), 0);
    assert_eq!(stats.ridge_density(), result.ridge_metrics().ridge_count);
    assert_eq!(stats.pattern_complexity(), result.ridge_metrics().orientation_variance);
    assert!(stats.total_minutiae() <= 100);
}

#[test]
fn test_minutiae_stay_inside_raster() {
    let raster = noise_raster(80, 60, 11);
    let result = PatternAnalyzer::default().analyze(&raster).unwrap();
    for p in result.minutiae().iter() {
        assert!(p.x >= 0 && p.x < 80);
        assert!(p.y >= 0 && p.y < 60);
        assert_ne!(p.kind, MinutiaKind::Crossing);
    }
}

#[test]
fn test_quality_in_range() {
    for seed in 0..3 {
        let score = quality_score(&noise_raster(64, 64, seed), 0.4, 0.6);
        assert!((0.0..=100.0).contains(&score.value()));
        assert!(score.value() > 0.0);
    }
}

#[test]
fn test_quality_score_clamps() {
    assert_eq!(QualityScore::new(150.0).value(), 100.0);
    assert_eq!(QualityScore::new(-3.0).value(), 0.0);
    assert_eq!(QualityScore::new(f64::NAN).value(), 0.0);
    assert_eq!(QualityScore::new(42.5).value(), 42.5);
}

#[test]
fn test_pattern_thresholds() {
    let whorl = SpectrumStats { mean: 10.0, std_dev: 120.0 };
    let arch = SpectrumStats { mean: 60.0, std_dev: 20.0 };
    let loop_ = SpectrumStats { mean: 30.0, std_dev: 20.0 };

    assert_eq!(classify(whorl, 100.0, 50.0), PatternClass::Whorl);
    assert_eq!(classify(arch, 100.0, 50.0), PatternClass::Arch);
    assert_eq!(classify(loop_, 100.0, 50.0), PatternClass::Loop);
    assert_eq!(classify(arch, 100.0, 70.0), PatternClass::Loop);
}

#[test]
fn test_textured_spectrum_is_richer_than_flat() {
    let (_, flat) = classify_pattern(&Raster::filled(32, 32, 90).unwrap(), 100.0, 50.0);
    let (_, textured) = classify_pattern(&noise_raster(32, 32, 5), 100.0, 50.0);
    assert!(textured.mean > flat.mean);
}

#[test]
fn test_good_features_finds_square_corners() {
    let raster = square(64, 22, 42);
    let corners = good_features(&raster, 100, 0.01, 10.0, 3);

    assert_eq!(corners.len(), 4);
    for expected in [(22, 22), (41, 22), (22, 41), (41, 41)] {
        assert!(
            corners.iter().any(|&(x, y)| x.abs_diff(expected.0) <= 3 && y.abs_diff(expected.1) <= 3),
            "no corner near {:?} in {:?}",
            expected,
            corners
        );
    }
}

#[test]
fn test_good_features_respects_max_count() {
    let corners = good_features(&noise_raster(64, 64, 2), 5, 0.01, 3.0, 3);
    assert!(corners.len() <= 5);
}

#[test]
fn test_adaptive_threshold_keeps_flat_regions_foreground() {
    let binary = adaptive_threshold(&Raster::filled(16, 16, 40).unwrap(), 2.0, 2.0);
    assert!(binary.pixels().iter().all(|&v| v == 255));
}

#[test]
fn test_statistics_from_parts() {
    let set = MinutiaeSet::new(vec![
        MinutiaPoint { x: 1, y: 1, kind: MinutiaKind::Ending },
        MinutiaPoint { x: 2, y: 5, kind: MinutiaKind::Bifurcation },
        MinutiaPoint { x: 7, y: 3, kind: MinutiaKind::Ending },
    ]);
    let ridges = RidgeMetrics { ridge_count: 1.5, mean_orientation: 0.1, orientation_variance: 0.7 };
    let stats = Statistics::from_parts(&set, &ridges);

    assert_eq!(stats.total_minutiae(), 3);
    assert_eq!(stats.ending_count(), 2);
    assert_eq!(stats.bifurcation_count(), 1);
    assert_eq!(stats.ridge_density(), 1.5);
    assert_eq!(stats.pattern_complexity(), 0.7);

    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["total_minutiae"], 3);
    assert_eq!(
        json["total_minutiae"].as_u64(),
        Some(json["ending_count"].as_u64().unwrap() + json["bifurcation_count"].as_u64().unwrap())
    );
}

#[test]
fn test_invalid_config_rejected() {
    let config = AnalysisConfig { adaptive_block_size: 10, ..AnalysisConfig::default() };
    assert!(matches!(PatternAnalyzer::new(config).unwrap_err(), FingerprintError::InvalidConfig(_)));
}
