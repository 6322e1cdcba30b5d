//! Report types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::fingerprint::analysis::AnalysisResult;
use crate::fingerprint::common::timing::StageTimings;
use crate::fingerprint::enhancement::EnhancementMetrics;
use crate::fingerprint::matching::MatchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Match,
    Inconclusive,
    NoMatch,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Recommendation::Match => "Match",
            Recommendation::Inconclusive => "Inconclusive",
            Recommendation::NoMatch => "No match",
        };
        f.write_str(label)
    }
}

/// Score and quality floors for each recommendation tier. Both quality scores
/// must clear the quality floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub match_score: f64,
    pub match_quality: f64,
    pub inconclusive_score: f64,
    pub inconclusive_quality: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            match_score: 80.0,
            match_quality: 70.0,
            inconclusive_score: 60.0,
            inconclusive_quality: 60.0,
        }
    }
}

impl RecommendationThresholds {
    pub fn recommend(&self, primary_score: f64, quality_a: f64, quality_b: f64) -> Recommendation {
        let quality = quality_a.min(quality_b);
        if primary_score >= self.match_score && quality >= self.match_quality {
            Recommendation::Match
        } else if primary_score >= self.inconclusive_score && quality >= self.inconclusive_quality {
            Recommendation::Inconclusive
        } else {
            Recommendation::NoMatch
        }
    }
}

/// One side of the comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub enhancement: EnhancementMetrics,
    pub analysis: AnalysisResult,
}

/// Everything a caller needs to present one comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub request_id: Uuid,
    pub first: ImageReport,
    pub second: ImageReport,
    #[serde(rename = "matching")]
    pub match_result: MatchResult,
    pub recommendation: Recommendation,
    pub timings: StageTimings,
}
