use crate::fingerprint::common::measure::{
    edge_pixel_count, intensity_std, mean_abs_laplacian, percent_change, safe_div,
};
use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::enhancement::types::{EnhancementConfig, EnhancementMetrics};

pub fn compute_metrics(original: &Raster, enhanced: &Raster, config: &EnhancementConfig) -> EnhancementMetrics {
    EnhancementMetrics {
        contrast_improvement_pct: contrast_improvement(original, enhanced),
        noise_reduction_pct: noise_reduction(original, enhanced),
        ridge_clarity_pct: ridge_clarity(enhanced, config.canny_low, config.canny_high),
        restored_area_pct: restored_area(original, enhanced, config.restored_threshold),
    }
}

/// Relative change of the intensity standard deviation; 0 for a flat original.
pub fn contrast_improvement(original: &Raster, enhanced: &Raster) -> f64 {
    percent_change(intensity_std(original), intensity_std(enhanced))
}

/// Relative drop of the mean absolute Laplacian; 0 when the original has none.
pub fn noise_reduction(original: &Raster, enhanced: &Raster) -> f64 {
    let before = mean_abs_laplacian(original);
    let after = mean_abs_laplacian(enhanced);
    safe_div(before - after, before) * 100.0
}

/// Share of edge pixels in the enhanced raster.
pub fn ridge_clarity(enhanced: &Raster, low: f32, high: f32) -> f64 {
    safe_div(edge_pixel_count(enhanced, low, high) as f64, enhanced.len() as f64) * 100.0
}

/// Share of pixels whose intensity moved by more than `threshold`.
pub fn restored_area(original: &Raster, enhanced: &Raster, threshold: u8) -> f64 {
    let changed = original
        .pixels()
        .iter()
        .zip(enhanced.pixels())
        .filter(|&(&a, &b)| a.abs_diff(b) > threshold)
        .count();
    safe_div(changed as f64, original.len() as f64) * 100.0
}
