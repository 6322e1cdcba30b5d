//! Matching engine configuration

use serde::{Deserialize, Serialize};

use crate::fingerprint::common::error::{FingerprintError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Intensity difference a FAST ring pixel needs to count as brighter or darker
    pub fast_threshold: u8,
    /// Keypoints kept per image, strongest first
    pub max_keypoints: usize,
    pub pyramid_levels: usize,
    /// Downscale factor between consecutive pyramid levels
    pub scale_factor: f64,
    /// Radius of the square patch sampled by the binary descriptor
    pub patch_radius: i32,
    /// Radius of the disc used for the intensity-centroid orientation
    pub orientation_radius: i32,
    /// Nearest/second-nearest distance ratio a match must stay below
    pub ratio_threshold: f64,
    /// Hamming distance above which a nearest neighbour is rejected outright
    pub max_hamming_distance: u32,
    /// Seed of the descriptor sampling pattern
    pub pattern_seed: u64,
    /// Distance within which two aligned minutiae pair up, pixels
    pub secondary_tolerance: f64,
    /// Translation vote bin size, pixels
    pub secondary_bin_size: f64,
    /// Render and store overlays; scores are computed either way
    pub render_visualizations: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_keypoints: 500,
            pyramid_levels: 4,
            scale_factor: 1.2,
            patch_radius: 13,
            orientation_radius: 15,
            ratio_threshold: 0.75,
            max_hamming_distance: 64,
            pattern_seed: 0x5EED_0F_F1,
            secondary_tolerance: 8.0,
            secondary_bin_size: 4.0,
            render_visualizations: true,
        }
    }
}

impl MatchingConfig {
    pub fn builder() -> MatchingConfigBuilder {
        MatchingConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_keypoints == 0 {
            return Err(FingerprintError::InvalidConfig("max_keypoints must be positive".into()));
        }
        if self.pyramid_levels == 0 {
            return Err(FingerprintError::InvalidConfig("pyramid_levels must be positive".into()));
        }
        if self.scale_factor <= 1.0 {
            return Err(FingerprintError::InvalidConfig(format!(
                "scale_factor must be greater than 1, got {}",
                self.scale_factor
            )));
        }
        if self.patch_radius < 1 || self.orientation_radius < 1 {
            return Err(FingerprintError::InvalidConfig("descriptor radii must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.ratio_threshold) || self.ratio_threshold == 0.0 {
            return Err(FingerprintError::InvalidConfig("ratio_threshold must lie in (0, 1]".into()));
        }
        if self.secondary_tolerance <= 0.0 || self.secondary_bin_size <= 0.0 {
            return Err(FingerprintError::InvalidConfig(
                "secondary tolerance and bin size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Pixels excluded at every image border so that descriptor sampling
    /// never leaves the image.
    pub(crate) fn border(&self) -> i32 {
        self.patch_radius.max(self.orientation_radius) + 3
    }
}

#[derive(Default)]
pub struct MatchingConfigBuilder {
    fast_threshold: Option<u8>,
    max_keypoints: Option<usize>,
    pyramid_levels: Option<usize>,
    scale_factor: Option<f64>,
    descriptor_radii: Option<(i32, i32)>,
    ratio_threshold: Option<f64>,
    max_hamming_distance: Option<u32>,
    pattern_seed: Option<u64>,
    secondary_tolerance: Option<f64>,
    secondary_bin_size: Option<f64>,
    render_visualizations: Option<bool>,
}

impl MatchingConfigBuilder {
    pub fn fast_threshold(mut self, threshold: u8) -> Self {
        self.fast_threshold = Some(threshold);
        self
    }

    pub fn max_keypoints(mut self, max: usize) -> Self {
        self.max_keypoints = Some(max);
        self
    }

    pub fn pyramid(mut self, levels: usize, scale_factor: f64) -> Self {
        self.pyramid_levels = Some(levels);
        self.scale_factor = Some(scale_factor);
        self
    }

    /// Descriptor patch radius and orientation disc radius.
    pub fn descriptor_radii(mut self, patch_radius: i32, orientation_radius: i32) -> Self {
        self.descriptor_radii = Some((patch_radius, orientation_radius));
        self
    }

    pub fn ratio_threshold(mut self, ratio: f64) -> Self {
        self.ratio_threshold = Some(ratio);
        self
    }

    pub fn max_hamming_distance(mut self, distance: u32) -> Self {
        self.max_hamming_distance = Some(distance);
        self
    }

    pub fn pattern_seed(mut self, seed: u64) -> Self {
        self.pattern_seed = Some(seed);
        self
    }

    pub fn secondary_tolerance(mut self, tolerance: f64) -> Self {
        self.secondary_tolerance = Some(tolerance);
        self
    }

    pub fn secondary_bin_size(mut self, bin_size: f64) -> Self {
        self.secondary_bin_size = Some(bin_size);
        self
    }

    pub fn render_visualizations(mut self, enable: bool) -> Self {
        self.render_visualizations = Some(enable);
        self
    }

    pub fn build(self) -> MatchingConfig {
        let default = MatchingConfig::default();
        let (patch_radius, orientation_radius) = self
            .descriptor_radii
            .unwrap_or((default.patch_radius, default.orientation_radius));
        MatchingConfig {
            fast_threshold: self.fast_threshold.unwrap_or(default.fast_threshold),
            max_keypoints: self.max_keypoints.unwrap_or(default.max_keypoints),
            pyramid_levels: self.pyramid_levels.unwrap_or(default.pyramid_levels),
            scale_factor: self.scale_factor.unwrap_or(default.scale_factor),
            patch_radius,
            orientation_radius,
            ratio_threshold: self.ratio_threshold.unwrap_or(default.ratio_threshold),
            max_hamming_distance: self.max_hamming_distance.unwrap_or(default.max_hamming_distance),
            pattern_seed: self.pattern_seed.unwrap_or(default.pattern_seed),
            secondary_tolerance: self.secondary_tolerance.unwrap_or(default.secondary_tolerance),
            secondary_bin_size: self.secondary_bin_size.unwrap_or(default.secondary_bin_size),
            render_visualizations: self.render_visualizations.unwrap_or(default.render_visualizations),
        }
    }
}
