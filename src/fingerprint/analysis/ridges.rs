use crate::fingerprint::analysis::types::RidgeMetrics;
use crate::fingerprint::common::measure::{central_gradients, edge_pixel_count, mean, safe_div, std_dev};
use crate::fingerprint::common::raster::Raster;

/// Edge density plus the mean and spread of gradient orientations.
pub fn ridge_metrics(raster: &Raster, canny_low: f32, canny_high: f32, count_divisor: f64) -> RidgeMetrics {
    let edges = edge_pixel_count(raster, canny_low, canny_high);
    let (d_rows, d_cols) = central_gradients(raster);
    let angles: Vec<f64> = d_cols
        .iter()
        .zip(&d_rows)
        .map(|(&gx, &gy)| gx.atan2(gy))
        .collect();

    RidgeMetrics {
        ridge_count: safe_div(edges as f64, count_divisor),
        mean_orientation: mean(angles.iter().copied()),
        orientation_variance: std_dev(&angles),
    }
}
