//! Stage 6: output tone normalization.
//!
//! Maps the fused image onto a fixed global spread so that a second pass over
//! an already enhanced raster lands on the same contrast it started from.

use crate::fingerprint::common::measure::{safe_div, saturate_u8};
use crate::fingerprint::common::raster::Raster;

/// Center of the normalized output range.
const OUTPUT_MEAN: f64 = 128.0;
const MAX_GAIN_DOUBLINGS: usize = 32;
const BISECTION_STEPS: usize = 48;

fn histogram(raster: &Raster) -> [usize; 256] {
    let mut hist = [0usize; 256];
    for &v in raster.pixels() {
        hist[v as usize] += 1;
    }
    hist
}

fn mapped(level: usize, mean: f64, gain: f64) -> u8 {
    saturate_u8(OUTPUT_MEAN + gain * (level as f64 - mean))
}

/// Standard deviation of the raster after mapping with `gain`, from its histogram.
fn spread(hist: &[usize; 256], total: f64, mean: f64, gain: f64) -> f64 {
    let (sum, sum_sq) = hist
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .fold((0.0, 0.0), |(sum, sum_sq), (level, &count)| {
            let v = mapped(level, mean, gain) as f64;
            (sum + v * count as f64, sum_sq + v * v * count as f64)
        });
    let m = safe_div(sum, total);
    (safe_div(sum_sq, total) - m * m).max(0.0).sqrt()
}

/// Affine remap `128 + gain * (v - mean)` with the gain chosen so the saturated
/// result has standard deviation `target_std`. A flat raster is returned as is;
/// when saturation caps the reachable spread the largest tried gain is used.
pub fn normalize_tone(raster: &Raster, target_std: f64) -> Raster {
    let hist = histogram(raster);
    let total = raster.len() as f64;
    let mean = safe_div(
        hist.iter().enumerate().map(|(level, &c)| level as f64 * c as f64).sum(),
        total,
    );
    let current = spread(&hist, total, mean, 1.0);
    if current == 0.0 || target_std <= 0.0 {
        return raster.clone();
    }

    let mut lo = 0.0;
    let mut hi = target_std / current;
    for _ in 0..MAX_GAIN_DOUBLINGS {
        if spread(&hist, total, mean, hi) >= target_std {
            break;
        }
        lo = hi;
        hi *= 2.0;
    }
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if spread(&hist, total, mean, mid) < target_std {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let lut: Vec<u8> = (0..256).map(|level| mapped(level, mean, hi)).collect();
    raster.map(|v| lut[v as usize])
}
