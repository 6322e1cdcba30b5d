//! Synthetic rasters for unit tests.

use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fingerprint::common::raster::Raster;

/// Concentric sinusoidal ridges around an off-centre core, mapped into
/// `[base - amplitude, base + amplitude]`.
pub fn ridge_pattern(width: usize, height: usize, period: f64, base: f64, amplitude: f64) -> Raster {
    let (cx, cy) = (width as f64 * 0.45, height as f64 * 0.55);
    let data = (0..width * height)
        .map(|i| {
            let (x, y) = ((i % width) as f64, (i / width) as f64);
            let r = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
            let v = base + amplitude * (2.0 * std::f64::consts::PI * r / period).cos();
            v.round().clamp(0.0, 255.0) as u8
        })
        .collect();
    Raster::new(width, height, data).expect("valid synthetic raster")
}

/// Uniform white noise.
pub fn noise_raster(width: usize, height: usize, seed: u64) -> Raster {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height).map(|_| rng.random::<u8>()).collect();
    Raster::new(width, height, data).expect("valid synthetic raster")
}

/// Blurred, contrast-stretched noise: a non-repeating texture with plenty of
/// distinct corners.
pub fn textured_raster(width: usize, height: usize, seed: u64) -> Raster {
    let noise = noise_raster(width, height, seed).into_gray_image();
    let blurred: GrayImage = gaussian_blur_f32(&noise, 1.5);
    let min = blurred.pixels().map(|p| p.0[0]).min().unwrap_or(0);
    let max = blurred.pixels().map(|p| p.0[0]).max().unwrap_or(255);
    let span = (max - min).max(1) as f64;
    let data = blurred
        .pixels()
        .map(|p| ((p.0[0] - min) as f64 * 255.0 / span).round() as u8)
        .collect();
    Raster::new(width, height, data).expect("valid synthetic raster")
}

/// Horizontal ridges with seeded gaps of varying length, shifted by
/// `(dx, dy)` (at most 30 pixels either way). Every gap leaves two ridge
/// endings.
pub fn broken_ridges(width: usize, height: usize, seed: u64, dx: i64, dy: i64) -> Raster {
    const PERIOD: i64 = 10;
    const CELL: i64 = 32;
    const PAD: i64 = 4;
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = height as i64 / PERIOD + 2 * PAD;
    let cols = width as i64 / CELL + 2 * PAD;
    // (gap start, gap length) per ridge and cell, or None for an unbroken stretch
    let gaps: Vec<Option<(i64, i64)>> = (0..rows * cols)
        .map(|_| {
            let start = rng.random_range(0..14);
            let len = rng.random_range(10..18);
            rng.random_bool(0.6).then_some((start, len))
        })
        .collect();

    let data = (0..width * height)
        .map(|i| {
            let (u, v) = ((i % width) as i64 - dx, (i / width) as i64 - dy);
            let (row, col) = (v.div_euclid(PERIOD) + PAD, u.div_euclid(CELL) + PAD);
            let on_ridge = (3..7).contains(&v.rem_euclid(PERIOD));
            let in_gap = match gaps.get((row * cols + col) as usize).copied().flatten() {
                Some((start, len)) => (start..start + len).contains(&u.rem_euclid(CELL)),
                None => false,
            };
            if on_ridge && !in_gap { 40 } else { 210 }
        })
        .collect();
    Raster::new(width, height, data).expect("valid synthetic raster")
}
