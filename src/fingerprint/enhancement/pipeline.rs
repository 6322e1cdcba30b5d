use tracing::{debug, info, instrument};

use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::common::timing::StageTimings;
use crate::fingerprint::enhancement::{
    contrast::normalize_contrast,
    denoise::denoise,
    edges::fuse_edges,
    metrics::compute_metrics,
    restoration::restore_damaged_areas,
    ridges::enhance_ridges,
    tone::normalize_tone,
    types::{EnhancementConfig, EnhancementResult},
};

/// Runs the enhancement stages in fixed order.
#[derive(Debug, Clone, Default)]
pub struct FingerprintEnhancer {
    config: EnhancementConfig,
}

impl FingerprintEnhancer {
    pub fn new(config: EnhancementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnhancementConfig {
        &self.config
    }

    #[instrument(skip(self, raster), fields(width = raster.width(), height = raster.height()))]
    pub fn enhance(&self, raster: &Raster) -> Result<EnhancementResult> {
        self.enhance_with_timings(raster).map(|(result, _)| result)
    }

    pub fn enhance_with_timings(&self, raster: &Raster) -> Result<(EnhancementResult, StageTimings)> {
        if raster.is_empty() {
            return Err(FingerprintError::InvalidImage("empty raster passed to enhancement".into()));
        }
        let cfg = &self.config;
        let stages = cfg.stages;
        let mut timings = StageTimings::new();

        let img = timings.time("contrast", || {
            let _span = tracing::info_span!("contrast").entered();
            if stages.contrast {
                normalize_contrast(raster, cfg.clahe_clip_limit, cfg.clahe_tiles)
            } else {
                raster.clone()
            }
        });

        let img = timings.time("denoise", || {
            let _span = tracing::info_span!("denoise").entered();
            if stages.denoise {
                denoise(&img, cfg.nlm_strength, cfg.nlm_patch_size, cfg.nlm_search_window, cfg.median_radius)
            } else {
                img
            }
        });

        let img = timings.time("ridges", || {
            let _span = tracing::info_span!("ridges").entered();
            if stages.ridges { enhance_ridges(&img, &cfg.gabor) } else { img }
        });

        let img = timings.time("restoration", || {
            let _span = tracing::info_span!("restoration").entered();
            if stages.restoration {
                restore_damaged_areas(&img, cfg.closing_radius, cfg.inpaint_radius)
            } else {
                img
            }
        });

        let img = timings.time("edge_fusion", || {
            let _span = tracing::info_span!("edge_fusion").entered();
            if stages.edge_fusion {
                fuse_edges(&img, cfg.canny_low, cfg.canny_high, cfg.image_weight, cfg.edge_weight)
            } else {
                img
            }
        });

        let enhanced = timings.time("tone", || {
            let _span = tracing::info_span!("tone").entered();
            if stages.tone { normalize_tone(&img, cfg.output_std) } else { img }
        });

        let metrics = timings.time("metrics", || compute_metrics(raster, &enhanced, cfg));
        debug!(?metrics, "enhancement metrics");
        info!(
            contrast = metrics.contrast_improvement_pct,
            noise = metrics.noise_reduction_pct,
            millis = timings.total_duration().as_secs_f64() * 1000.0,
            "Enhancement complete"
        );

        Ok((
            EnhancementResult {
                original: raster.clone(),
                enhanced,
                metrics,
            },
            timings,
        ))
    }
}
