//! Result assembly
//!
//! Merges both images' enhancement and analysis outputs with the match
//! result into a [`ComparisonReport`], and drives a full comparison through
//! [`ComparisonPipeline`].

mod assembler;
mod config;
mod pipeline;
mod types;


pub use assembler::{ImageOutcome, assemble};
pub use config::{ComparisonConfig, ComparisonConfigBuilder, MatchInput};
pub use pipeline::ComparisonPipeline;
pub use types::{ComparisonReport, ImageReport, Recommendation, RecommendationThresholds};
