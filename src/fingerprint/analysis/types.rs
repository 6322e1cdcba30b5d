//! Analysis result types

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinutiaKind {
    Ending,
    Bifurcation,
    /// Declared for completeness; the corner heuristic never produces it.
    Crossing,
}

/// A candidate ridge feature in the analyzed raster's pixel frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinutiaPoint {
    pub x: i32,
    pub y: i32,
    pub kind: MinutiaKind,
}

/// Unordered minutiae of one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinutiaeSet {
    points: Vec<MinutiaPoint>,
}

impl MinutiaeSet {
    pub fn new(points: Vec<MinutiaPoint>) -> Self {
        Self { points }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MinutiaPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count(&self, kind: MinutiaKind) -> usize {
        self.points.iter().filter(|p| p.kind == kind).count()
    }

    pub fn of_kind(&self, kind: MinutiaKind) -> impl Iterator<Item = &MinutiaPoint> {
        self.points.iter().filter(move |p| p.kind == kind)
    }
}

/// Global ridge-flow class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternClass {
    Whorl,
    Arch,
    Loop,
}

impl fmt::Display for PatternClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PatternClass::Whorl => "Whorl",
            PatternClass::Arch => "Arch",
            PatternClass::Loop => "Loop",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RidgeMetrics {
    /// Edge-pixel count divided by a fixed divisor. Scale dependent.
    pub ridge_count: f64,
    /// Mean gradient orientation, radians.
    pub mean_orientation: f64,
    /// Spread of gradient orientations, reported as a standard deviation in radians.
    pub orientation_variance: f64,
}

/// Quality in `[0, 100]`; clamped on construction, NaN maps to 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualityScore(f64);

impl QualityScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(Self::MIN);
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Counts and ridge figures derived from a minutiae set and ridge metrics.
/// Only built through [`Statistics::from_parts`], so the total always equals
/// the sum of the per-kind counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    total_minutiae: usize,
    ending_count: usize,
    bifurcation_count: usize,
    crossing_count: usize,
    ridge_density: f64,
    pattern_complexity: f64,
}

impl Statistics {
    pub fn from_parts(minutiae: &MinutiaeSet, ridges: &RidgeMetrics) -> Self {
        let ending_count = minutiae.count(MinutiaKind::Ending);
        let bifurcation_count = minutiae.count(MinutiaKind::Bifurcation);
        let crossing_count = minutiae.count(MinutiaKind::Crossing);
        Self {
            total_minutiae: ending_count + bifurcation_count + crossing_count,
            ending_count,
            bifurcation_count,
            crossing_count,
            ridge_density: ridges.ridge_count,
            pattern_complexity: ridges.orientation_variance,
        }
    }

    pub fn total_minutiae(&self) -> usize {
        self.total_minutiae
    }

    pub fn ending_count(&self) -> usize {
        self.ending_count
    }

    pub fn bifurcation_count(&self) -> usize {
        self.bifurcation_count
    }

    pub fn crossing_count(&self) -> usize {
        self.crossing_count
    }

    pub fn ridge_density(&self) -> f64 {
        self.ridge_density
    }

    pub fn pattern_complexity(&self) -> f64 {
        self.pattern_complexity
    }
}

/// Everything the analyzer learned about one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pattern: PatternClass,
    minutiae: MinutiaeSet,
    ridge_metrics: RidgeMetrics,
    quality: QualityScore,
    statistics: Statistics,
}

impl AnalysisResult {
    pub fn new(pattern: PatternClass, minutiae: MinutiaeSet, ridge_metrics: RidgeMetrics, quality: QualityScore) -> Self {
        let statistics = Statistics::from_parts(&minutiae, &ridge_metrics);
        Self {
            pattern,
            minutiae,
            ridge_metrics,
            quality,
            statistics,
        }
    }

    pub fn pattern(&self) -> PatternClass {
        self.pattern
    }

    pub fn minutiae(&self) -> &MinutiaeSet {
        &self.minutiae
    }

    pub fn ridge_metrics(&self) -> &RidgeMetrics {
        &self.ridge_metrics
    }

    pub fn quality(&self) -> QualityScore {
        self.quality
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }
}
