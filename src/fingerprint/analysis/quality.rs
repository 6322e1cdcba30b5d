use crate::fingerprint::analysis::types::QualityScore;
use crate::fingerprint::common::measure::{intensity_std, mean_abs_laplacian};
use crate::fingerprint::common::raster::Raster;

/// Weighted blend of global contrast and local sharpness, normalized by the
/// 8-bit ceiling and scaled to `[0, 100]`.
///
/// A flat raster has zero deviation and zero Laplacian response and scores 0.
pub fn quality_score(raster: &Raster, contrast_weight: f64, sharpness_weight: f64) -> QualityScore {
    let contrast = intensity_std(raster);
    let sharpness = mean_abs_laplacian(raster);
    QualityScore::new((contrast * contrast_weight + sharpness * sharpness_weight) / 255.0 * 100.0)
}
