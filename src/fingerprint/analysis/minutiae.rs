//! Minutiae candidates.
//!
//! This is a coarse proxy, not forensic-grade extraction: strong corners of a
//! locally binarized image stand in for ridge endings and bifurcations, and
//! the kind is guessed from how much foreground surrounds each corner.
//! Crossings are never produced.

use std::cmp::Ordering;

use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::fingerprint::analysis::config::AnalysisConfig;
use crate::fingerprint::analysis::types::{MinutiaKind, MinutiaPoint, MinutiaeSet};
use crate::fingerprint::common::raster::Raster;

pub fn detect_minutiae(raster: &Raster, config: &AnalysisConfig) -> MinutiaeSet {
    let binary = adaptive_threshold(raster, config.adaptive_sigma(), config.adaptive_offset);
    let corners = good_features(
        &binary,
        config.max_corners,
        config.corner_quality,
        config.min_corner_distance,
        config.corner_block_size,
    );
    let points = corners
        .into_iter()
        .map(|(x, y)| MinutiaPoint {
            x: x as i32,
            y: y as i32,
            kind: classify(&binary, x, y, config.neighbourhood_radius, config.ending_cutoff),
        })
        .collect();
    MinutiaeSet::new(points)
}

/// Gaussian-weighted local threshold: a pixel is foreground (255) when it is
/// brighter than its blurred neighbourhood minus `offset`.
pub fn adaptive_threshold(raster: &Raster, sigma: f32, offset: f64) -> Raster {
    let local = gaussian_blur_f32(raster.as_gray_image(), sigma);
    let out = raster
        .pixels()
        .iter()
        .zip(local.as_raw())
        .map(|(&v, &m)| if v as f64 > m as f64 - offset { 255 } else { 0 })
        .collect();
    Raster::from_buffer(raster.width(), raster.height(), out)
}

/// Shi-Tomasi corners: local maxima of the structure tensor's smaller
/// eigenvalue, strongest first, at least `min_distance` apart.
pub fn good_features(
    raster: &Raster,
    max_corners: usize,
    quality: f64,
    min_distance: f64,
    block_size: usize,
) -> Vec<(usize, usize)> {
    let response = min_eigenvalues(raster, block_size);
    let (w, h) = (raster.width(), raster.height());
    let max = response.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 || max_corners == 0 {
        return Vec::new();
    }
    let threshold = max * quality;

    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let v = response[y * w + x];
            if v <= threshold {
                continue;
            }
            let is_peak = (-1isize..=1).all(|dy| {
                (-1isize..=1).all(|dx| {
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize
                        || response[ny as usize * w + nx as usize] <= v
                })
            });
            if is_peak {
                candidates.push((x, y, v));
            }
        }
    }
    candidates.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

    let min_d2 = min_distance * min_distance;
    let mut accepted: Vec<(usize, usize)> = Vec::new();
    for (x, y, _) in candidates {
        let far_enough = accepted.iter().all(|&(ax, ay)| {
            let (dx, dy) = (ax as f64 - x as f64, ay as f64 - y as f64);
            dx * dx + dy * dy >= min_d2
        });
        if far_enough {
            accepted.push((x, y));
            if accepted.len() >= max_corners {
                break;
            }
        }
    }
    accepted
}

/// Smaller eigenvalue of the gradient structure tensor summed over a
/// `block_size` window.
fn min_eigenvalues(raster: &Raster, block_size: usize) -> Vec<f64> {
    let gx = horizontal_sobel(raster.as_gray_image());
    let gy = vertical_sobel(raster.as_gray_image());
    let (w, h) = (raster.width(), raster.height());

    let mut xx = vec![0.0; w * h];
    let mut xy = vec![0.0; w * h];
    let mut yy = vec![0.0; w * h];
    for (i, (a, b)) in gx.pixels().zip(gy.pixels()).enumerate() {
        let (dx, dy) = (a.0[0] as f64, b.0[0] as f64);
        xx[i] = dx * dx;
        xy[i] = dx * dy;
        yy[i] = dy * dy;
    }

    let half = (block_size / 2) as isize;
    let mut out = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            let (mut a, mut b, mut c) = (0.0, 0.0, 0.0);
            for dy in -half..=half {
                for dx in -half..=half {
                    let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                    let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                    let j = sy * w + sx;
                    a += xx[j];
                    b += xy[j];
                    c += yy[j];
                }
            }
            let half_trace = (a + c) / 2.0;
            let root = (((a - c) / 2.0).powi(2) + b * b).sqrt();
            out[y * w + x] = (half_trace - root).max(0.0);
        }
    }
    out
}

/// Ending when the foreground fraction around `(x, y)` is below `cutoff`,
/// bifurcation otherwise.
fn classify(binary: &Raster, x: usize, y: usize, radius: usize, cutoff: f64) -> MinutiaKind {
    let x0 = x.saturating_sub(radius);
    let y0 = y.saturating_sub(radius);
    let x1 = (x + radius).min(binary.width() - 1);
    let y1 = (y + radius).min(binary.height() - 1);

    let mut total = 0usize;
    let mut foreground = 0usize;
    for yy in y0..=y1 {
        for xx in x0..=x1 {
            total += 1;
            if binary.get(xx, yy).unwrap_or(0) > 0 {
                foreground += 1;
            }
        }
    }
    if (foreground as f64) < cutoff * total as f64 {
        MinutiaKind::Ending
    } else {
        MinutiaKind::Bifurcation
    }
}
