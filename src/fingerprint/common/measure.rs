//! Numeric helpers shared by the metrics, analysis and matching code.
//!
//! Every helper that divides resolves an empty or zero denominator to `0.0`
//! so that no NaN or infinity can reach a caller-visible score.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::laplacian_filter;

use crate::fingerprint::common::raster::Raster;

/// Arithmetic mean, `0.0` for an empty slice.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    safe_div(sum, count as f64)
}

/// Population standard deviation, `0.0` for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let variance = mean(values.iter().map(|v| (v - m) * (v - m)));
    variance.max(0.0).sqrt()
}

/// Population standard deviation of a raster's intensities.
pub fn intensity_std(raster: &Raster) -> f64 {
    let values: Vec<f64> = raster.pixels().iter().map(|&v| v as f64).collect();
    std_dev(&values)
}

/// `numerator / denominator`, or `0.0` when the result would not be finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

/// Relative change `(after - before) / before * 100`, `0.0` when `before` is zero.
pub fn percent_change(before: f64, after: f64) -> f64 {
    safe_div(after - before, before) * 100.0
}

/// Signed 4-neighbour Laplacian response per pixel.
pub fn laplacian(raster: &Raster) -> Vec<i16> {
    laplacian_filter(raster.as_gray_image())
        .pixels()
        .map(|p| p.0[0])
        .collect()
}

/// Mean absolute Laplacian response, a proxy for local sharpness / noise.
pub fn mean_abs_laplacian(raster: &Raster) -> f64 {
    mean(laplacian(raster).into_iter().map(|v| (v as f64).abs()))
}

/// Canny edge map; edge pixels are 255, everything else 0.
pub fn edge_map(raster: &Raster, low: f32, high: f32) -> GrayImage {
    canny(raster.as_gray_image(), low, high)
}

/// Number of edge pixels found by [`edge_map`].
pub fn edge_pixel_count(raster: &Raster, low: f32, high: f32) -> usize {
    edge_map(raster, low, high)
        .pixels()
        .filter(|p| p.0[0] > 0)
        .count()
}

/// Central-difference gradients along rows and columns, one-sided at the
/// borders. Returns `(d/dy, d/dx)`.
pub fn central_gradients(raster: &Raster) -> (Vec<f64>, Vec<f64>) {
    let (w, h) = (raster.width(), raster.height());
    let px = raster.pixels();
    let at = |x: usize, y: usize| px[y * w + x] as f64;

    let mut dy = vec![0.0; w * h];
    let mut dx = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            dy[y * w + x] = if h < 2 {
                0.0
            } else if y == 0 {
                at(x, 1) - at(x, 0)
            } else if y == h - 1 {
                at(x, h - 1) - at(x, h - 2)
            } else {
                (at(x, y + 1) - at(x, y - 1)) / 2.0
            };
            dx[y * w + x] = if w < 2 {
                0.0
            } else if x == 0 {
                at(1, y) - at(0, y)
            } else if x == w - 1 {
                at(w - 1, y) - at(w - 2, y)
            } else {
                (at(x + 1, y) - at(x - 1, y)) / 2.0
            };
        }
    }
    (dy, dx)
}

/// Rounds and saturates a float sample into the 8-bit range.
#[inline]
pub fn saturate_u8(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.round().clamp(0.0, 255.0) as u8
    }
}
