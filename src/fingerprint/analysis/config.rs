//! Analyzer configuration
//!
//! The defaults are empirical constants without calibration data behind them;
//! they are exposed so they can be tuned and tested independently.

use serde::{Deserialize, Serialize};

use crate::fingerprint::common::error::{FingerprintError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Global histogram equalization before any measurement
    pub equalize_histogram: bool,
    /// Neighbourhood side of the Gaussian adaptive threshold (odd)
    pub adaptive_block_size: usize,
    /// Constant subtracted from the local Gaussian mean
    pub adaptive_offset: f64,
    /// Upper bound on detected minutiae candidates
    pub max_corners: usize,
    /// Minimum corner strength relative to the strongest corner
    pub corner_quality: f64,
    /// Minimum Euclidean distance between accepted corners, pixels
    pub min_corner_distance: f64,
    /// Window side used to accumulate the gradient structure tensor (odd)
    pub corner_block_size: usize,
    /// Radius of the neighbourhood inspected to classify a minutia
    pub neighbourhood_radius: usize,
    /// Foreground fraction below which a minutia is an ending
    pub ending_cutoff: f64,
    /// Log-spectrum standard deviation above which the pattern is a whorl
    pub spectrum_std_threshold: f64,
    /// Log-spectrum mean above which the pattern is an arch
    pub spectrum_mean_threshold: f64,
    pub ridge_canny_low: f32,
    pub ridge_canny_high: f32,
    /// Divisor turning an edge-pixel count into `ridge_count`
    pub ridge_count_divisor: f64,
    /// Quality weight of the global intensity standard deviation
    pub contrast_weight: f64,
    /// Quality weight of the mean Laplacian response
    pub sharpness_weight: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            equalize_histogram: true,
            adaptive_block_size: 11,
            adaptive_offset: 2.0,
            max_corners: 100,
            corner_quality: 0.01,
            min_corner_distance: 10.0,
            corner_block_size: 3,
            neighbourhood_radius: 2,
            ending_cutoff: 0.5,
            spectrum_std_threshold: 100.0,
            spectrum_mean_threshold: 50.0,
            ridge_canny_low: 100.0,
            ridge_canny_high: 200.0,
            ridge_count_divisor: 1000.0,
            contrast_weight: 0.4,
            sharpness_weight: 0.6,
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "adaptive_block_size must be odd and >= 3, got {}",
                self.adaptive_block_size
            )));
        }
        if self.corner_block_size == 0 || self.corner_block_size % 2 == 0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "corner_block_size must be odd, got {}",
                self.corner_block_size
            )));
        }
        if !(0.0..=1.0).contains(&self.corner_quality) {
            return Err(FingerprintError::InvalidConfig("corner_quality must lie in [0, 1]".into()));
        }
        if self.ridge_count_divisor <= 0.0 {
            return Err(FingerprintError::InvalidConfig("ridge_count_divisor must be positive".into()));
        }
        Ok(())
    }

    /// Gaussian sigma matching the adaptive block size.
    pub(crate) fn adaptive_sigma(&self) -> f32 {
        (0.3 * ((self.adaptive_block_size as f64 - 1.0) * 0.5 - 1.0) + 0.8) as f32
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    equalize_histogram: Option<bool>,
    max_corners: Option<usize>,
    corner_quality: Option<f64>,
    min_corner_distance: Option<f64>,
    ending_cutoff: Option<f64>,
    spectrum_thresholds: Option<(f64, f64)>,
    quality_weights: Option<(f64, f64)>,
}

impl AnalysisConfigBuilder {
    pub fn equalize_histogram(mut self, enable: bool) -> Self {
        self.equalize_histogram = Some(enable);
        self
    }

    pub fn max_corners(mut self, max: usize) -> Self {
        self.max_corners = Some(max);
        self
    }

    pub fn corner_quality(mut self, quality: f64) -> Self {
        self.corner_quality = Some(quality);
        self
    }

    pub fn min_corner_distance(mut self, distance: f64) -> Self {
        self.min_corner_distance = Some(distance);
        self
    }

    pub fn ending_cutoff(mut self, cutoff: f64) -> Self {
        self.ending_cutoff = Some(cutoff);
        self
    }

    pub fn spectrum_thresholds(mut self, std_threshold: f64, mean_threshold: f64) -> Self {
        self.spectrum_thresholds = Some((std_threshold, mean_threshold));
        self
    }

    pub fn quality_weights(mut self, contrast: f64, sharpness: f64) -> Self {
        self.quality_weights = Some((contrast, sharpness));
        self
    }

    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();
        let (spectrum_std_threshold, spectrum_mean_threshold) = self
            .spectrum_thresholds
            .unwrap_or((default.spectrum_std_threshold, default.spectrum_mean_threshold));
        let (contrast_weight, sharpness_weight) = self
            .quality_weights
            .unwrap_or((default.contrast_weight, default.sharpness_weight));
        AnalysisConfig {
            equalize_histogram: self.equalize_histogram.unwrap_or(default.equalize_histogram),
            max_corners: self.max_corners.unwrap_or(default.max_corners),
            corner_quality: self.corner_quality.unwrap_or(default.corner_quality),
            min_corner_distance: self.min_corner_distance.unwrap_or(default.min_corner_distance),
            ending_cutoff: self.ending_cutoff.unwrap_or(default.ending_cutoff),
            spectrum_std_threshold,
            spectrum_mean_threshold,
            contrast_weight,
            sharpness_weight,
            ..default
        }
    }
}
