//! Stage 3: ridge enhancement.

use rayon::prelude::*;

use crate::fingerprint::common::measure::{laplacian, saturate_u8};
use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::enhancement::types::GaborParams;

/// Gabor band-pass filtering followed by absolute Laplacian amplification.
pub fn enhance_ridges(raster: &Raster, params: &GaborParams) -> Raster {
    let kernel = balance_kernel(gabor_kernel(params));
    let filtered = correlate(raster, &kernel, params.kernel_size);
    let response = laplacian(&filtered);
    let out = response.iter().map(|&v| (v as i32).unsigned_abs().min(255) as u8).collect();
    Raster::from_buffer(raster.width(), raster.height(), out)
}

/// Real Gabor kernel, row-major `size x size`, stored flipped so that it can be
/// applied by correlation.
pub fn gabor_kernel(params: &GaborParams) -> Vec<f64> {
    let size = params.kernel_size;
    let half = (size / 2) as isize;
    let sigma_x = params.sigma;
    let sigma_y = params.sigma / params.gamma;
    let ex = -0.5 / (sigma_x * sigma_x);
    let ey = -0.5 / (sigma_y * sigma_y);
    let (s, c) = params.theta.sin_cos();
    let wave = 2.0 * std::f64::consts::PI / params.lambda;

    let mut kernel = vec![0.0; size * size];
    for y in -half..=half {
        for x in -half..=half {
            let xr = x as f64 * c + y as f64 * s;
            let yr = -(x as f64) * s + y as f64 * c;
            let v = (ex * xr * xr + ey * yr * yr).exp() * (wave * xr + params.psi).cos();
            kernel[((half - y) as usize) * size + (half - x) as usize] = v;
        }
    }
    kernel
}

/// Removes the DC component and scales the positive lobe to unit sum, so a
/// flat region maps to zero and a matched ridge pattern stays inside 8 bits.
pub fn balance_kernel(mut kernel: Vec<f64>) -> Vec<f64> {
    let mean = kernel.iter().sum::<f64>() / kernel.len().max(1) as f64;
    kernel.iter_mut().for_each(|k| *k -= mean);
    let positive: f64 = kernel.iter().filter(|k| **k > 0.0).sum();
    if positive > 0.0 {
        kernel.iter_mut().for_each(|k| *k /= positive);
    }
    kernel
}

/// 2-D correlation with reflect-101 borders, saturated to 8 bits.
fn correlate(raster: &Raster, kernel: &[f64], size: usize) -> Raster {
    let (w, h) = (raster.width(), raster.height());
    let half = (size / 2) as isize;
    let px = raster.pixels();

    let mut out = vec![0u8; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, dst) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for ky in 0..size {
                let sy = reflect101(y as isize + ky as isize - half, h);
                let krow = &kernel[ky * size..(ky + 1) * size];
                for (kx, &k) in krow.iter().enumerate() {
                    let sx = reflect101(x as isize + kx as isize - half, w);
                    acc += k * px[sy * w + sx] as f64;
                }
            }
            *dst = saturate_u8(acc);
        }
    });
    Raster::from_buffer(w, h, out)
}

/// Mirror index into `[0, n)` without repeating the edge sample.
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

#[cfg(test)]
mod kernel_tests {
    use super::*;

    #[test]
    fn reflect101_mirrors_without_repeating_edge() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(2, 5), 2);
    }

    #[test]
    fn gabor_kernel_peaks_at_centre() {
        let params = GaborParams::default();
        let kernel = gabor_kernel(&params);
        let size = params.kernel_size;
        let centre = kernel[(size / 2) * size + size / 2];
        assert!((centre - 1.0).abs() < 1e-12);
        assert!(kernel.iter().all(|&v| v <= centre + 1e-12));
    }

    #[test]
    fn balanced_kernel_has_zero_dc_and_unit_positive_lobe() {
        let kernel = balance_kernel(gabor_kernel(&GaborParams::default()));
        let sum: f64 = kernel.iter().sum();
        let positive: f64 = kernel.iter().filter(|k| **k > 0.0).sum();
        assert!(sum.abs() < 1e-9);
        assert!((positive - 1.0).abs() < 1e-9);
    }
}
