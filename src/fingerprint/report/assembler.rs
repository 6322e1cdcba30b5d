use uuid::Uuid;

use crate::fingerprint::analysis::AnalysisResult;
use crate::fingerprint::common::timing::StageTimings;
use crate::fingerprint::enhancement::EnhancementResult;
use crate::fingerprint::matching::MatchResult;
use crate::fingerprint::report::types::{ComparisonReport, ImageReport, RecommendationThresholds};

/// Per-image outputs gathered before assembly.
#[derive(Debug, Clone)]
pub struct ImageOutcome {
    pub enhancement: EnhancementResult,
    pub analysis: AnalysisResult,
}

/// Merges both images' outcomes and the match result into one report. No
/// computation happens here beyond the recommendation thresholds.
pub fn assemble(
    request_id: Uuid,
    first: ImageOutcome,
    second: ImageOutcome,
    match_result: MatchResult,
    thresholds: &RecommendationThresholds,
    timings: StageTimings,
) -> ComparisonReport {
    let recommendation = thresholds.recommend(
        match_result.primary_score(),
        first.analysis.quality().value(),
        second.analysis.quality().value(),
    );
    ComparisonReport {
        request_id,
        first: ImageReport {
            enhancement: first.enhancement.metrics,
            analysis: first.analysis,
        },
        second: ImageReport {
            enhancement: second.enhancement.metrics,
            analysis: second.analysis,
        },
        match_result,
        recommendation,
        timings,
    }
}
