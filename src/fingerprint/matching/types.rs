//! Matching result types

use serde::Serialize;

use crate::fingerprint::store::ArtifactRef;

/// A detected keypoint in full-resolution image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Dominant orientation, radians
    pub angle: f32,
    /// FAST corner strength, comparable within one image
    pub response: f32,
    /// Pyramid level the keypoint was found on
    pub octave: u8,
}

/// 256-bit binary descriptor.
pub type Descriptor = [u8; 32];

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// An accepted correspondence between feature `query_idx` of the first image
/// and feature `train_idx` of the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// References to the stored renders. Each is `None` when rendering was
/// disabled or the store refused the artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisualizationRefs {
    pub minutiae_a: Option<ArtifactRef>,
    pub minutiae_b: Option<ArtifactRef>,
    pub match_overlay: Option<ArtifactRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    primary_score: f64,
    secondary_score: f64,
    keypoint_count_a: usize,
    keypoint_count_b: usize,
    good_match_count: usize,
    visualization_refs: VisualizationRefs,
}

impl MatchResult {
    /// Scores are clamped to `[0, 100]` (NaN becomes 0) and the good-match
    /// count is capped at the smaller keypoint count.
    pub fn new(
        primary_score: f64,
        secondary_score: f64,
        keypoint_count_a: usize,
        keypoint_count_b: usize,
        good_match_count: usize,
        visualization_refs: VisualizationRefs,
    ) -> Self {
        Self {
            primary_score: clamp_score(primary_score),
            secondary_score: clamp_score(secondary_score),
            keypoint_count_a,
            keypoint_count_b,
            good_match_count: good_match_count.min(keypoint_count_a.min(keypoint_count_b)),
            visualization_refs,
        }
    }

    /// Zero-valued result for a pair on which no features could be matched.
    pub fn unmatchable(keypoint_count_a: usize, keypoint_count_b: usize, secondary_score: f64) -> Self {
        Self::new(0.0, secondary_score, keypoint_count_a, keypoint_count_b, 0, VisualizationRefs::default())
    }

    pub fn primary_score(&self) -> f64 {
        self.primary_score
    }

    pub fn secondary_score(&self) -> f64 {
        self.secondary_score
    }

    pub fn keypoint_count_a(&self) -> usize {
        self.keypoint_count_a
    }

    pub fn keypoint_count_b(&self) -> usize {
        self.keypoint_count_b
    }

    pub fn good_match_count(&self) -> usize {
        self.good_match_count
    }

    pub fn visualization_refs(&self) -> &VisualizationRefs {
        &self.visualization_refs
    }

    pub(crate) fn with_visualizations(mut self, refs: VisualizationRefs) -> Self {
        self.visualization_refs = refs;
        self
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}

/// `good / min(a, b) * 100`, clamped; 0 when either side has no keypoints.
pub fn primary_score(good_match_count: usize, keypoint_count_a: usize, keypoint_count_b: usize) -> f64 {
    let smaller = keypoint_count_a.min(keypoint_count_b);
    if smaller == 0 {
        return 0.0;
    }
    clamp_score(good_match_count as f64 / smaller as f64 * 100.0)
}
