//! Fingerprint comparison core
//!
//! Enhancement, pattern/quality analysis and pairwise matching of grayscale
//! fingerprint rasters, assembled into a single comparison report.

pub mod analysis;
pub mod common;
pub mod enhancement;
pub mod matching;
pub mod report;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use analysis::{AnalysisConfig, AnalysisResult, PatternAnalyzer, PatternClass, QualityScore};
pub use common::{FingerprintError, Raster, RequestContext, Result, RgbRaster, StageTimings};
pub use enhancement::{EnhancementConfig, EnhancementMetrics, EnhancementResult, FingerprintEnhancer};
pub use matching::{MatchResult, MatchingConfig, MatchingEngine};
pub use report::{
    ComparisonConfig, ComparisonPipeline, ComparisonReport, MatchInput, Recommendation,
    RecommendationThresholds,
};
pub use store::{ArtifactKind, ArtifactRef, ArtifactStore, MemoryArtifactStore, TiffArtifactStore};
