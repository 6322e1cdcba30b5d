use imageproc::contrast::equalize_histogram;
use tracing::{debug, info, instrument};

use crate::fingerprint::analysis::{
    config::AnalysisConfig,
    minutiae::detect_minutiae,
    pattern::classify_pattern,
    quality::quality_score,
    ridges::ridge_metrics,
    types::AnalysisResult,
};
use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::Raster;

/// Minutiae, pattern class, ridge metrics and quality for a single raster.
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: AnalysisConfig,
}

impl PatternAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[instrument(skip(self, raster), fields(width = raster.width(), height = raster.height()))]
    pub fn analyze(&self, raster: &Raster) -> Result<AnalysisResult> {
        if raster.is_empty() {
            return Err(FingerprintError::InvalidImage("empty raster passed to analysis".into()));
        }
        let cfg = &self.config;

        let equalized;
        let img = if cfg.equalize_histogram {
            equalized = Raster::from_stage(equalize_histogram(raster.as_gray_image()));
            &equalized
        } else {
            raster
        };

        let minutiae = {
            let _span = tracing::info_span!("minutiae").entered();
            detect_minutiae(img, cfg)
        };

        let pattern = {
            let _span = tracing::info_span!("pattern").entered();
            let (pattern, spectrum) =
                classify_pattern(img, cfg.spectrum_std_threshold, cfg.spectrum_mean_threshold);
            debug!(mean = spectrum.mean, std_dev = spectrum.std_dev, %pattern, "spectrum classified");
            pattern
        };

        let ridges = {
            let _span = tracing::info_span!("ridges").entered();
            ridge_metrics(img, cfg.ridge_canny_low, cfg.ridge_canny_high, cfg.ridge_count_divisor)
        };

        let quality = quality_score(img, cfg.contrast_weight, cfg.sharpness_weight);
        if quality.value() == 0.0 {
            debug!("degenerate raster, quality floored at 0");
        }

        let result = AnalysisResult::new(pattern, minutiae, ridges, quality);
        info!(
            pattern = %result.pattern(),
            minutiae = result.statistics().total_minutiae(),
            quality = result.quality().value(),
            "Analysis complete"
        );
        Ok(result)
    }
}
