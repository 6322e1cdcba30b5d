//! Pattern and quality analysis
//!
//! Candidate minutiae, a global pattern class, ridge density and orientation
//! figures, and a 0-100 quality score for one raster.

mod analyzer;
mod config;
pub mod minutiae;
pub mod pattern;
pub mod quality;
pub mod ridges;
mod types;

#[cfg(test)]
mod tests;

pub use analyzer::PatternAnalyzer;
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use types::{
    AnalysisResult, MinutiaKind, MinutiaPoint, MinutiaeSet, PatternClass, QualityScore,
    RidgeMetrics, Statistics,
};
