//! Stage 1: contrast normalization.
//!
//! Contrast-limited adaptive histogram equalization over a square tile grid,
//! with bilinear blending between neighbouring tile mappings, followed by a
//! global stretch to the full 8-bit range.

use rayon::prelude::*;

use crate::fingerprint::common::raster::Raster;

const BINS: usize = 256;

/// CLAHE followed by a global intensity rescale.
pub fn normalize_contrast(raster: &Raster, clip_limit: f64, tiles: usize) -> Raster {
    let equalized = clahe(raster, clip_limit, tiles);
    rescale_intensity(&equalized)
}

/// Contrast-limited adaptive histogram equalization.
pub fn clahe(raster: &Raster, clip_limit: f64, tiles: usize) -> Raster {
    let (w, h) = (raster.width(), raster.height());
    let tiles_x = tiles.clamp(1, w);
    let tiles_y = tiles.clamp(1, h);
    let px = raster.pixels();

    let luts: Vec<[u8; BINS]> = (0..tiles_x * tiles_y)
        .map(|t| {
            let (tx, ty) = (t % tiles_x, t / tiles_x);
            let (x0, x1) = (tx * w / tiles_x, (tx + 1) * w / tiles_x);
            let (y0, y1) = (ty * h / tiles_y, (ty + 1) * h / tiles_y);

            let mut hist = [0usize; BINS];
            for y in y0..y1 {
                for &v in &px[y * w + x0..y * w + x1] {
                    hist[v as usize] += 1;
                }
            }
            tile_lut(&mut hist, (x1 - x0) * (y1 - y0), clip_limit)
        })
        .collect();

    let tile_w = w as f64 / tiles_x as f64;
    let tile_h = h as f64 / tiles_y as f64;
    let mut out = vec![0u8; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);
        for (x, dst) in row.iter_mut().enumerate() {
            let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
            let v = px[y * w + x] as usize;
            let top = (1.0 - ax) * luts[ty0 * tiles_x + tx0][v] as f64
                + ax * luts[ty0 * tiles_x + tx1][v] as f64;
            let bottom = (1.0 - ax) * luts[ty1 * tiles_x + tx0][v] as f64
                + ax * luts[ty1 * tiles_x + tx1][v] as f64;
            *dst = ((1.0 - ay) * top + ay * bottom).round().clamp(0.0, 255.0) as u8;
        }
    });

    Raster::from_buffer(w, h, out)
}

/// Linear stretch of `[min, max]` onto `[0, 255]`; a flat raster is returned unchanged.
pub fn rescale_intensity(raster: &Raster) -> Raster {
    let px = raster.pixels();
    let min = px.iter().copied().min().unwrap_or(0);
    let max = px.iter().copied().max().unwrap_or(0);
    if max <= min {
        return raster.clone();
    }
    let scale = 255.0 / (max - min) as f64;
    raster.map(|v| ((v - min) as f64 * scale).round() as u8)
}

/// Clips the histogram, redistributes the excess and turns the CDF into a
/// lookup table.
fn tile_lut(hist: &mut [usize; BINS], area: usize, clip_limit: f64) -> [u8; BINS] {
    let mut lut = [0u8; BINS];
    if area == 0 {
        return lut;
    }

    if clip_limit > 0.0 {
        let clip = ((clip_limit * area as f64 / BINS as f64) as usize).max(1);
        let mut excess = 0usize;
        for bin in hist.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }
        let share = excess / BINS;
        let residual = excess % BINS;
        for bin in hist.iter_mut() {
            *bin += share;
        }
        for i in 0..residual {
            hist[i * BINS / residual] += 1;
        }
    }

    let scale = 255.0 / area as f64;
    let mut cdf = 0usize;
    for (v, &count) in hist.iter().enumerate() {
        cdf += count;
        lut[v] = (cdf as f64 * scale).round().min(255.0) as u8;
    }
    lut
}

/// The two tile indices whose centres bracket `pos`, and the blend weight of
/// the second one.
fn neighbours(pos: usize, tile_size: f64, tiles: usize) -> (usize, usize, f64) {
    let f = (pos as f64 + 0.5) / tile_size - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let lower = (f.floor() as usize).min(tiles - 1);
    let upper = (lower + 1).min(tiles - 1);
    let weight = if upper == lower { 0.0 } else { f - lower as f64 };
    (lower, upper, weight)
}
