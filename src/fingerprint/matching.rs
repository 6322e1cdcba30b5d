//! Matching engine
//!
//! Extracts oriented keypoints from both rasters, matches their binary
//! descriptors and turns the accepted matches into a primary score. A
//! skeleton-topology comparator produces a secondary score on the same pair;
//! the two are reported side by side and never blended.

mod config;
pub mod descriptor;
mod engine;
pub mod orb;
pub mod secondary;
mod types;
pub mod visualize;

#[cfg(test)]
mod tests;

pub use config::{MatchingConfig, MatchingConfigBuilder};
pub use descriptor::DescriptorMatcher;
pub use engine::MatchingEngine;
pub use orb::{FeatureDetector, OrbDetector};
pub use secondary::{MinutiaeTopologyMatcher, SecondaryMatcher};
pub use types::{Descriptor, Feature, FeatureMatch, Keypoint, MatchResult, VisualizationRefs, primary_score};
