//! Global pattern classification from the 2-D log-magnitude spectrum.
//!
//! The decision rule is a pair of fixed thresholds on the spectrum's spread
//! and level. It is a placeholder classifier pending labelled data.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use crate::fingerprint::analysis::types::PatternClass;
use crate::fingerprint::common::measure::{mean, std_dev};
use crate::fingerprint::common::raster::Raster;

/// Summary statistics of the log-magnitude spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumStats {
    pub mean: f64,
    pub std_dev: f64,
}

pub fn classify_pattern(raster: &Raster, std_threshold: f64, mean_threshold: f64) -> (PatternClass, SpectrumStats) {
    let spectrum = magnitude_spectrum(raster);
    let stats = SpectrumStats {
        mean: mean(spectrum.iter().copied()),
        std_dev: std_dev(&spectrum),
    };
    (classify(stats, std_threshold, mean_threshold), stats)
}

pub fn classify(stats: SpectrumStats, std_threshold: f64, mean_threshold: f64) -> PatternClass {
    if stats.std_dev > std_threshold {
        PatternClass::Whorl
    } else if stats.mean > mean_threshold {
        PatternClass::Arch
    } else {
        PatternClass::Loop
    }
}

/// `20 ln(|F| + 1)` of the 2-D DFT, with the zero frequency moved to the centre.
pub fn magnitude_spectrum(raster: &Raster) -> Vec<f64> {
    let (w, h) = (raster.width(), raster.height());
    let mut data: Vec<Complex<f64>> = raster
        .pixels()
        .iter()
        .map(|&v| Complex::new(v as f64, 0.0))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft_forward(w);
    for row in data.chunks_exact_mut(w) {
        row_fft.process(row);
    }

    let col_fft = planner.plan_fft_forward(h);
    let mut column = vec![Complex::new(0.0, 0.0); h];
    for x in 0..w {
        for y in 0..h {
            column[y] = data[y * w + x];
        }
        col_fft.process(&mut column);
        for y in 0..h {
            data[y * w + x] = column[y];
        }
    }

    let mut shifted = vec![0.0; w * h];
    for y in 0..h {
        for x in 0..w {
            let sx = (x + w / 2) % w;
            let sy = (y + h / 2) % h;
            shifted[sy * w + sx] = 20.0 * (data[y * w + x].norm() + 1.0).ln();
        }
    }
    shifted
}
