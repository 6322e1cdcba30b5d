//! Oriented FAST keypoints with rotated binary descriptors.

use std::cmp::Ordering;

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::filter::gaussian_blur_f32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::matching::config::MatchingConfig;
use crate::fingerprint::matching::types::{Descriptor, Feature, Keypoint};

/// Bresenham circle of radius 3, clockwise from 12 o'clock.
const RING: [(i32, i32); 16] = [
    (0, -3), (1, -3), (2, -2), (3, -1), (3, 0), (3, 1), (2, 2), (1, 3),
    (0, 3), (-1, 3), (-2, 2), (-3, 1), (-3, 0), (-3, -1), (-2, -2), (-1, -3),
];

/// Contiguous ring pixels required for a FAST corner.
const ARC_LENGTH: usize = 9;

const DESCRIPTOR_BITS: usize = 256;

/// Extracts keypoints and descriptors from one raster.
pub trait FeatureDetector: Send + Sync {
    fn detect(&self, raster: &Raster) -> Vec<Feature>;

    fn name(&self) -> &'static str;
}

/// Point pairs compared by the binary descriptor, relative to the keypoint.
#[derive(Debug, Clone)]
struct SamplingPattern {
    pairs: Vec<(i32, i32, i32, i32)>,
}

impl SamplingPattern {
    fn generate(seed: u64, radius: i32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = (0..DESCRIPTOR_BITS)
            .map(|_| {
                (
                    rng.random_range(-radius..=radius),
                    rng.random_range(-radius..=radius),
                    rng.random_range(-radius..=radius),
                    rng.random_range(-radius..=radius),
                )
            })
            .collect();
        Self { pairs }
    }
}

#[derive(Debug, Clone)]
pub struct OrbDetector {
    config: MatchingConfig,
    pattern: SamplingPattern,
}

impl Default for OrbDetector {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl OrbDetector {
    pub fn new(config: MatchingConfig) -> Self {
        let pattern = SamplingPattern::generate(config.pattern_seed, config.patch_radius);
        Self { config, pattern }
    }

    /// Level images with their scale relative to the input. Stops early once
    /// a level is too small to hold a descriptor patch.
    fn build_pyramid(&self, image: &GrayImage) -> Vec<(GrayImage, f32)> {
        let min_side = (2 * self.config.border() + 1) as u32;
        let mut pyramid = vec![(image.clone(), 1.0f32)];
        let mut scale = 1.0f64;

        for _ in 1..self.config.pyramid_levels {
            scale *= self.config.scale_factor;
            let width = (image.width() as f64 / scale).round() as u32;
            let height = (image.height() as f64 / scale).round() as u32;
            if width < min_side || height < min_side {
                break;
            }
            let level = imageops::resize(image, width, height, FilterType::Triangle);
            pyramid.push((level, scale as f32));
        }
        pyramid
    }

    fn detect_level(&self, level: &GrayImage, octave: u8, scale: f32) -> Vec<Feature> {
        let corners = fast_corners(level, self.config.fast_threshold, self.config.border());
        if corners.is_empty() {
            return Vec::new();
        }
        let smoothed = gaussian_blur_f32(level, 2.0);

        corners
            .par_iter()
            .map(|&(x, y, response)| {
                let angle = intensity_centroid_angle(level, x, y, self.config.orientation_radius);
                let descriptor = self.describe(&smoothed, x, y, angle);
                Feature {
                    keypoint: Keypoint {
                        x: x as f32 * scale,
                        y: y as f32 * scale,
                        angle,
                        response,
                        octave,
                    },
                    descriptor,
                }
            })
            .collect()
    }

    /// Rotated BRIEF: one bit per sampled pair, set when the first point is
    /// darker than the second.
    fn describe(&self, image: &GrayImage, x: i32, y: i32, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let mut descriptor = [0u8; 32];
        for (bit, &(x1, y1, x2, y2)) in self.pattern.pairs.iter().enumerate() {
            let rotate = |dx: i32, dy: i32| {
                let rx = (dx as f32 * cos - dy as f32 * sin).round() as i32;
                let ry = (dx as f32 * sin + dy as f32 * cos).round() as i32;
                sample(image, x + rx, y + ry)
            };
            if rotate(x1, y1) < rotate(x2, y2) {
                descriptor[bit / 8] |= 1 << (bit % 8);
            }
        }
        descriptor
    }
}

impl FeatureDetector for OrbDetector {
    fn detect(&self, raster: &Raster) -> Vec<Feature> {
        let pyramid = self.build_pyramid(raster.as_gray_image());

        let mut features: Vec<Feature> = pyramid
            .par_iter()
            .enumerate()
            .flat_map_iter(|(octave, (level, scale))| self.detect_level(level, octave as u8, *scale))
            .collect();

        features.sort_by(|a, b| {
            b.keypoint
                .response
                .partial_cmp(&a.keypoint.response)
                .unwrap_or(Ordering::Equal)
        });
        features.truncate(self.config.max_keypoints);

        debug!(levels = pyramid.len(), keypoints = features.len(), "features detected");
        features
    }

    fn name(&self) -> &'static str {
        "orb"
    }
}

fn sample(image: &GrayImage, x: i32, y: i32) -> u8 {
    let cx = x.clamp(0, image.width() as i32 - 1) as u32;
    let cy = y.clamp(0, image.height() as i32 - 1) as u32;
    image.get_pixel(cx, cy).0[0]
}

/// FAST-9 corners at least `border` pixels from every edge, after 3x3
/// non-maximum suppression on the corner score.
pub(crate) fn fast_corners(image: &GrayImage, threshold: u8, border: i32) -> Vec<(i32, i32, f32)> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w <= 2 * border || h <= 2 * border {
        return Vec::new();
    }

    let scores: Vec<f32> = (0..h)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..w).map(move |x| {
                if x < border || y < border || x >= w - border || y >= h - border {
                    0.0
                } else {
                    fast_score(image, x, y, threshold)
                }
            })
        })
        .collect();

    let at = |x: i32, y: i32| scores[(y * w + x) as usize];
    (border..h - border)
        .into_par_iter()
        .flat_map_iter(|y| {
            (border..w - border).filter_map(move |x| {
                let s = at(x, y);
                if s <= 0.0 {
                    return None;
                }
                // Ties go to the first pixel in raster order.
                let is_max = (-1..=1).all(|dy| {
                    (-1..=1).all(|dx| {
                        let n = at(x + dx, y + dy);
                        let before = dy < 0 || (dy == 0 && dx < 0);
                        (dx == 0 && dy == 0) || if before { n < s } else { n <= s }
                    })
                });
                is_max.then_some((x, y, s))
            })
        })
        .collect()
}

/// Sum of absolute ring differences beyond the threshold, or 0 when the
/// pixel has no arc of `ARC_LENGTH` brighter or darker ring pixels.
fn fast_score(image: &GrayImage, x: i32, y: i32, threshold: u8) -> f32 {
    let center = image.get_pixel(x as u32, y as u32).0[0] as i16;
    let t = threshold as i16;
    let mut diffs = [0i16; 16];
    for (d, &(dx, dy)) in diffs.iter_mut().zip(RING.iter()) {
        *d = image.get_pixel((x + dx) as u32, (y + dy) as u32).0[0] as i16 - center;
    }

    // Two compass points out of four must agree before the full arc test.
    let compass = [diffs[0], diffs[4], diffs[8], diffs[12]];
    if compass.iter().filter(|&&d| d > t).count() < 2 && compass.iter().filter(|&&d| d < -t).count() < 2 {
        return 0.0;
    }

    let has_arc = |pred: &dyn Fn(i16) -> bool| {
        let mut run = 0;
        for i in 0..RING.len() + ARC_LENGTH {
            if pred(diffs[i % RING.len()]) {
                run += 1;
                if run >= ARC_LENGTH {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    };
    if !has_arc(&|d| d > t) && !has_arc(&|d| d < -t) {
        return 0.0;
    }

    diffs
        .iter()
        .map(|&d| (d.abs() - t).max(0) as f32)
        .sum()
}

/// Orientation of the vector from the keypoint to the intensity centroid of
/// a disc around it.
pub(crate) fn intensity_centroid_angle(image: &GrayImage, x: i32, y: i32, radius: i32) -> f32 {
    let (mut m01, mut m10) = (0.0f64, 0.0f64);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let v = sample(image, x + dx, y + dy) as f64;
            m10 += dx as f64 * v;
            m01 += dy as f64 * v;
        }
    }
    m01.atan2(m10) as f32
}
