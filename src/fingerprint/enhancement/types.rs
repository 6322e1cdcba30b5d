//! Enhancement configuration and result types

use serde::{Deserialize, Serialize};

use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::Raster;

/// Parameters of the oriented band-pass kernel used for ridge enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaborParams {
    /// Kernel side length in pixels (odd)
    pub kernel_size: usize,
    /// Standard deviation of the Gaussian envelope
    pub sigma: f64,
    /// Orientation of the normal to the stripes, radians
    pub theta: f64,
    /// Wavelength of the sinusoid, roughly the ridge period in pixels
    pub lambda: f64,
    /// Spatial aspect ratio of the envelope
    pub gamma: f64,
    /// Phase offset
    pub psi: f64,
}

impl Default for GaborParams {
    fn default() -> Self {
        Self {
            kernel_size: 21,
            sigma: 8.0,
            theta: std::f64::consts::FRAC_PI_4,
            lambda: 10.0,
            gamma: 0.5,
            psi: 0.0,
        }
    }
}

/// Per-stage switches. A disabled stage passes its input through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub contrast: bool,
    pub denoise: bool,
    pub ridges: bool,
    pub restoration: bool,
    pub edge_fusion: bool,
    pub tone: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            contrast: true,
            denoise: true,
            ridges: true,
            restoration: true,
            edge_fusion: true,
            tone: true,
        }
    }
}

/// Configuration for the enhancement pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// CLAHE clip limit, relative to a flat histogram
    pub clahe_clip_limit: f64,
    /// CLAHE tile grid size along each axis
    pub clahe_tiles: usize,
    /// Non-local-means filter strength
    pub nlm_strength: f64,
    /// Non-local-means patch side (odd)
    pub nlm_patch_size: usize,
    /// Non-local-means search window side (odd)
    pub nlm_search_window: usize,
    /// Median filter radius; 1 means a 3x3 window
    pub median_radius: u32,
    pub gabor: GaborParams,
    /// Structuring element radius of the closing that marks damaged regions
    pub closing_radius: u8,
    /// Neighbourhood radius used while inpainting
    pub inpaint_radius: usize,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Blend weight of the restored image in edge fusion
    pub image_weight: f64,
    /// Blend weight of the edge map in edge fusion
    pub edge_weight: f64,
    /// Absolute intensity change above which a pixel counts as restored
    pub restored_threshold: u8,
    /// Global standard deviation the tone stage maps the output onto
    pub output_std: f64,
    pub stages: StageToggles,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            nlm_strength: 10.0,
            nlm_patch_size: 7,
            nlm_search_window: 21,
            median_radius: 1,
            gabor: GaborParams::default(),
            closing_radius: 1,
            inpaint_radius: 3,
            canny_low: 100.0,
            canny_high: 200.0,
            image_weight: 0.7,
            edge_weight: 0.3,
            restored_threshold: 30,
            output_std: 48.0,
            stages: StageToggles::default(),
        }
    }
}

impl EnhancementConfig {
    pub fn builder() -> EnhancementConfigBuilder {
        EnhancementConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.clahe_tiles == 0 {
            return Err(FingerprintError::InvalidConfig("clahe_tiles must be positive".into()));
        }
        if self.clahe_clip_limit < 0.0 {
            return Err(FingerprintError::InvalidConfig("clahe_clip_limit must be >= 0".into()));
        }
        if self.nlm_strength <= 0.0 {
            return Err(FingerprintError::InvalidConfig("nlm_strength must be positive".into()));
        }
        for (name, size) in [
            ("nlm_patch_size", self.nlm_patch_size),
            ("nlm_search_window", self.nlm_search_window),
            ("gabor.kernel_size", self.gabor.kernel_size),
        ] {
            if size == 0 || size % 2 == 0 {
                return Err(FingerprintError::InvalidConfig(format!("{name} must be odd, got {size}")));
            }
        }
        if self.gabor.sigma <= 0.0 || self.gabor.lambda <= 0.0 || self.gabor.gamma <= 0.0 {
            return Err(FingerprintError::InvalidConfig(
                "gabor sigma, lambda and gamma must be positive".into(),
            ));
        }
        if !(self.output_std > 0.0 && self.output_std < 127.5) {
            return Err(FingerprintError::InvalidConfig(format!(
                "output_std must lie in (0, 127.5), got {}",
                self.output_std
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(FingerprintError::InvalidConfig("canny_low exceeds canny_high".into()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct EnhancementConfigBuilder {
    clahe_clip_limit: Option<f64>,
    clahe_tiles: Option<usize>,
    nlm_strength: Option<f64>,
    nlm_patch_size: Option<usize>,
    nlm_search_window: Option<usize>,
    median_radius: Option<u32>,
    gabor: Option<GaborParams>,
    closing_radius: Option<u8>,
    inpaint_radius: Option<usize>,
    canny_thresholds: Option<(f32, f32)>,
    fusion_weights: Option<(f64, f64)>,
    restored_threshold: Option<u8>,
    output_std: Option<f64>,
    stages: Option<StageToggles>,
}

impl EnhancementConfigBuilder {
    pub fn clahe(mut self, clip_limit: f64, tiles: usize) -> Self {
        self.clahe_clip_limit = Some(clip_limit);
        self.clahe_tiles = Some(tiles);
        self
    }

    pub fn nlm_strength(mut self, strength: f64) -> Self {
        self.nlm_strength = Some(strength);
        self
    }

    pub fn nlm_windows(mut self, patch_size: usize, search_window: usize) -> Self {
        self.nlm_patch_size = Some(patch_size);
        self.nlm_search_window = Some(search_window);
        self
    }

    pub fn median_radius(mut self, radius: u32) -> Self {
        self.median_radius = Some(radius);
        self
    }

    pub fn gabor(mut self, gabor: GaborParams) -> Self {
        self.gabor = Some(gabor);
        self
    }

    pub fn closing_radius(mut self, radius: u8) -> Self {
        self.closing_radius = Some(radius);
        self
    }

    pub fn inpaint_radius(mut self, radius: usize) -> Self {
        self.inpaint_radius = Some(radius);
        self
    }

    pub fn canny_thresholds(mut self, low: f32, high: f32) -> Self {
        self.canny_thresholds = Some((low, high));
        self
    }

    pub fn fusion_weights(mut self, image_weight: f64, edge_weight: f64) -> Self {
        self.fusion_weights = Some((image_weight, edge_weight));
        self
    }

    pub fn restored_threshold(mut self, threshold: u8) -> Self {
        self.restored_threshold = Some(threshold);
        self
    }

    pub fn output_std(mut self, std: f64) -> Self {
        self.output_std = Some(std);
        self
    }

    pub fn stages(mut self, stages: StageToggles) -> Self {
        self.stages = Some(stages);
        self
    }

    pub fn build(self) -> EnhancementConfig {
        let default = EnhancementConfig::default();
        let (canny_low, canny_high) = self
            .canny_thresholds
            .unwrap_or((default.canny_low, default.canny_high));
        let (image_weight, edge_weight) = self
            .fusion_weights
            .unwrap_or((default.image_weight, default.edge_weight));
        EnhancementConfig {
            clahe_clip_limit: self.clahe_clip_limit.unwrap_or(default.clahe_clip_limit),
            clahe_tiles: self.clahe_tiles.unwrap_or(default.clahe_tiles),
            nlm_strength: self.nlm_strength.unwrap_or(default.nlm_strength),
            nlm_patch_size: self.nlm_patch_size.unwrap_or(default.nlm_patch_size),
            nlm_search_window: self.nlm_search_window.unwrap_or(default.nlm_search_window),
            median_radius: self.median_radius.unwrap_or(default.median_radius),
            gabor: self.gabor.unwrap_or(default.gabor),
            closing_radius: self.closing_radius.unwrap_or(default.closing_radius),
            inpaint_radius: self.inpaint_radius.unwrap_or(default.inpaint_radius),
            canny_low,
            canny_high,
            image_weight,
            edge_weight,
            restored_threshold: self.restored_threshold.unwrap_or(default.restored_threshold),
            output_std: self.output_std.unwrap_or(default.output_std),
            stages: self.stages.unwrap_or(default.stages),
        }
    }
}

/// Original-vs-enhanced improvement figures, all percentages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnhancementMetrics {
    pub contrast_improvement_pct: f64,
    pub noise_reduction_pct: f64,
    pub ridge_clarity_pct: f64,
    pub restored_area_pct: f64,
}

/// Output of one enhancement run.
#[derive(Debug, Clone)]
pub struct EnhancementResult {
    pub original: Raster,
    pub enhanced: Raster,
    pub metrics: EnhancementMetrics,
}
