//! Stage 5: edge fusion.

use crate::fingerprint::common::measure::{edge_map, saturate_u8};
use crate::fingerprint::common::raster::Raster;

/// Linear blend `image_weight * raster + edge_weight * canny(raster)`.
pub fn fuse_edges(raster: &Raster, low: f32, high: f32, image_weight: f64, edge_weight: f64) -> Raster {
    let edges = edge_map(raster, low, high);
    let out = raster
        .pixels()
        .iter()
        .zip(edges.as_raw())
        .map(|(&v, &e)| saturate_u8(image_weight * v as f64 + edge_weight * e as f64))
        .collect();
    Raster::from_buffer(raster.width(), raster.height(), out)
}
