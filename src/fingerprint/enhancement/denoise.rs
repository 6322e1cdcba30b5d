//! Stage 2: denoising.
//!
//! A non-local-means pass removes structured noise, then a small median
//! filter removes what is left of impulse noise.

use imageproc::filter::median_filter;
use rayon::prelude::*;

use crate::fingerprint::common::measure::saturate_u8;
use crate::fingerprint::common::raster::Raster;

pub fn denoise(
    raster: &Raster,
    strength: f64,
    patch_size: usize,
    search_window: usize,
    median_radius: u32,
) -> Raster {
    let smoothed = non_local_means(raster, strength, patch_size, search_window);
    if median_radius == 0 {
        return smoothed;
    }
    Raster::from_stage(median_filter(smoothed.as_gray_image(), median_radius, median_radius))
}

/// Non-local-means denoising.
///
/// Each output pixel is the weighted mean of every pixel in its search window,
/// weighted by `exp(-d / h^2)` where `d` is the mean squared difference between
/// the two surrounding patches. Patch distances are evaluated per search offset
/// with a summed-area table, so cost does not grow with the patch size.
pub fn non_local_means(raster: &Raster, strength: f64, patch_size: usize, search_window: usize) -> Raster {
    let (w, h) = (raster.width(), raster.height());
    let half_patch = (patch_size / 2) as isize;
    let half_search = (search_window / 2) as isize;
    let h2 = (strength * strength).max(f64::EPSILON);

    let src: Vec<f64> = raster.pixels().iter().map(|&v| v as f64).collect();
    let offsets: Vec<(isize, isize)> = (-half_search..=half_search)
        .flat_map(|dy| (-half_search..=half_search).map(move |dx| (dx, dy)))
        .collect();

    let (acc, weights) = offsets
        .par_iter()
        .fold(
            || (vec![0.0f64; w * h], vec![0.0f64; w * h]),
            |(mut acc, mut weights), &(dx, dy)| {
                let shifted: Vec<f64> = (0..w * h)
                    .map(|i| {
                        let (x, y) = ((i % w) as isize, (i / w) as isize);
                        raster.get_clamped(x + dx, y + dy) as f64
                    })
                    .collect();
                let table = SummedArea::new(
                    w,
                    h,
                    src.iter().zip(&shifted).map(|(a, b)| (a - b) * (a - b)),
                );

                for y in 0..h {
                    let y0 = (y as isize - half_patch).max(0) as usize;
                    let y1 = (y as isize + half_patch).min(h as isize - 1) as usize;
                    for x in 0..w {
                        let x0 = (x as isize - half_patch).max(0) as usize;
                        let x1 = (x as isize + half_patch).min(w as isize - 1) as usize;
                        let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as f64;
                        let distance = table.sum(x0, y0, x1, y1) / count;
                        let weight = (-distance / h2).exp();
                        let i = y * w + x;
                        acc[i] += weight * shifted[i];
                        weights[i] += weight;
                    }
                }
                (acc, weights)
            },
        )
        .reduce(
            || (vec![0.0f64; w * h], vec![0.0f64; w * h]),
            |(mut acc_a, mut w_a), (acc_b, w_b)| {
                acc_a.iter_mut().zip(acc_b).for_each(|(a, b)| *a += b);
                w_a.iter_mut().zip(w_b).for_each(|(a, b)| *a += b);
                (acc_a, w_a)
            },
        );

    let out = acc
        .iter()
        .zip(&weights)
        .zip(&src)
        .map(|((&a, &wsum), &orig)| if wsum > 0.0 { saturate_u8(a / wsum) } else { saturate_u8(orig) })
        .collect();
    Raster::from_buffer(w, h, out)
}

/// Summed-area table over a `w x h` grid.
struct SummedArea {
    stride: usize,
    table: Vec<f64>,
}

impl SummedArea {
    fn new(w: usize, h: usize, values: impl Iterator<Item = f64>) -> Self {
        let stride = w + 1;
        let mut table = vec![0.0; stride * (h + 1)];
        let values: Vec<f64> = values.collect();
        for y in 0..h {
            let mut row_sum = 0.0;
            for x in 0..w {
                row_sum += values[y * w + x];
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, table }
    }

    /// Inclusive rectangle sum.
    fn sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let s = self.stride;
        self.table[(y1 + 1) * s + x1 + 1] - self.table[y0 * s + x1 + 1] - self.table[(y1 + 1) * s + x0]
            + self.table[y0 * s + x0]
    }
}
