//! Overlay renders handed to the artifact store.

use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use crate::fingerprint::common::raster::{Raster, RgbRaster};
use crate::fingerprint::matching::types::{Feature, FeatureMatch};

const KEYPOINT_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const MATCH_COLOUR: Rgb<u8> = Rgb([255, 64, 0]);
const KEYPOINT_RADIUS: i32 = 3;

/// The raster in gray with a small circle on every keypoint.
pub fn draw_keypoints(raster: &Raster, features: &[Feature]) -> RgbRaster {
    let mut canvas = RgbRaster::from_raster(raster);
    let image = canvas.as_rgb_image_mut();
    for f in features {
        let centre = (f.keypoint.x.round() as i32, f.keypoint.y.round() as i32);
        draw_hollow_circle_mut(image, centre, KEYPOINT_RADIUS, KEYPOINT_COLOUR);
    }
    canvas
}

/// Both rasters side by side, top-aligned, with a line joining each matched
/// keypoint pair.
pub fn draw_matches(
    a: &Raster,
    features_a: &[Feature],
    b: &Raster,
    features_b: &[Feature],
    matches: &[FeatureMatch],
) -> RgbRaster {
    let left = draw_keypoints(a, features_a);
    let right = draw_keypoints(b, features_b);
    let width = (left.width() + right.width()) as u32;
    let height = left.height().max(right.height()) as u32;

    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, left.as_rgb_image(), 0, 0);
    imageops::replace(&mut canvas, right.as_rgb_image(), left.width() as i64, 0);

    let offset = left.width() as f32;
    for m in matches {
        let (Some(fa), Some(fb)) = (features_a.get(m.query_idx), features_b.get(m.train_idx)) else {
            continue;
        };
        draw_line_segment_mut(
            &mut canvas,
            (fa.keypoint.x, fa.keypoint.y),
            (fb.keypoint.x + offset, fb.keypoint.y),
            MATCH_COLOUR,
        );
    }
    RgbRaster::from_rgb_image(canvas)
}
