//! Comparison configuration
//!
//! One umbrella config carrying every stage's settings, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::fingerprint::analysis::AnalysisConfig;
use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::enhancement::EnhancementConfig;
use crate::fingerprint::matching::MatchingConfig;
use crate::fingerprint::report::types::RecommendationThresholds;

/// Which rasters the matching engine compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchInput {
    /// The caller's rasters as given; matching starts without waiting for enhancement
    Raw,
    #[default]
    Enhanced,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub enhancement: EnhancementConfig,
    pub analysis: AnalysisConfig,
    pub matching: MatchingConfig,
    pub thresholds: RecommendationThresholds,
    pub match_input: MatchInput,
    /// Largest accepted width or height; `None` disables the check
    pub max_dimension: Option<usize>,
}

impl ComparisonConfig {
    pub fn builder() -> ComparisonConfigBuilder {
        ComparisonConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.enhancement.validate()?;
        self.analysis.validate()?;
        self.matching.validate()?;

        let t = &self.thresholds;
        if t.inconclusive_score > t.match_score || t.inconclusive_quality > t.match_quality {
            return Err(FingerprintError::InvalidConfig(
                "inconclusive thresholds must not exceed match thresholds".into(),
            ));
        }
        if self.max_dimension == Some(0) {
            return Err(FingerprintError::InvalidConfig("max_dimension must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ComparisonConfigBuilder {
    enhancement: Option<EnhancementConfig>,
    analysis: Option<AnalysisConfig>,
    matching: Option<MatchingConfig>,
    thresholds: Option<RecommendationThresholds>,
    match_input: Option<MatchInput>,
    max_dimension: Option<Option<usize>>,
}

impl ComparisonConfigBuilder {
    pub fn enhancement(mut self, config: EnhancementConfig) -> Self {
        self.enhancement = Some(config);
        self
    }

    pub fn analysis(mut self, config: AnalysisConfig) -> Self {
        self.analysis = Some(config);
        self
    }

    pub fn matching(mut self, config: MatchingConfig) -> Self {
        self.matching = Some(config);
        self
    }

    pub fn thresholds(mut self, thresholds: RecommendationThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn match_input(mut self, input: MatchInput) -> Self {
        self.match_input = Some(input);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> ComparisonConfig {
        let default = ComparisonConfig::default();
        ComparisonConfig {
            enhancement: self.enhancement.unwrap_or(default.enhancement),
            analysis: self.analysis.unwrap_or(default.analysis),
            matching: self.matching.unwrap_or(default.matching),
            thresholds: self.thresholds.unwrap_or(default.thresholds),
            match_input: self.match_input.unwrap_or(default.match_input),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}
