//! Stage 4: damage restoration.
//!
//! Regions are flagged as damaged by a heuristic: pixels that a morphological
//! closing adds to the Otsu foreground, i.e. small tears and gaps inside ridge
//! structure. Flagged pixels are rebuilt from their surroundings
//! in fast-marching order, nearest-to-boundary first.

use std::collections::VecDeque;

use image::GrayImage;
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use tracing::debug;

use crate::fingerprint::common::measure::saturate_u8;
use crate::fingerprint::common::raster::Raster;

pub fn restore_damaged_areas(raster: &Raster, closing_radius: u8, inpaint_radius: usize) -> Raster {
    let mask = damaged_mask(raster, closing_radius);
    inpaint(raster, &mask, inpaint_radius)
}

/// Otsu binarization, square closing, and the difference between the two;
/// non-zero marks damage.
pub fn damaged_mask(raster: &Raster, closing_radius: u8) -> GrayImage {
    let level = otsu_level(raster.as_gray_image());
    let binary = raster.map(|v| if v > level { 255 } else { 0 });
    let mut mask = binary.as_gray_image().clone();
    if closing_radius == 0 {
        mask.pixels_mut().for_each(|p| p.0[0] = 0);
        return mask;
    }
    let closed = close(binary.as_gray_image(), Norm::LInf, closing_radius);
    for (m, (c, &b)) in mask.pixels_mut().zip(closed.pixels().zip(binary.pixels())) {
        m.0[0] = if c.0[0] > 0 && b == 0 { 255 } else { 0 };
    }
    mask
}

/// Fills every masked pixel from already-known pixels within `radius`.
///
/// Pixels are visited in breadth-first order outward from the known region,
/// which approximates the arrival-time ordering of a fast-marching front. Each
/// contribution is weighted by inverse squared distance and by how close its
/// arrival time is to the pixel being filled.
pub fn inpaint(raster: &Raster, mask: &GrayImage, radius: usize) -> Raster {
    let (w, h) = (raster.width(), raster.height());
    let mut values: Vec<f64> = raster.pixels().iter().map(|&v| v as f64).collect();
    let mut known: Vec<bool> = mask.pixels().map(|p| p.0[0] == 0).collect();
    let mut arrival = vec![0usize; w * h];

    let damaged = known.iter().filter(|k| !**k).count();
    if damaged == 0 || damaged == w * h {
        debug!(damaged, "nothing to inpaint");
        return raster.clone();
    }

    let mut queued = known.clone();
    let mut queue = VecDeque::new();
    for i in 0..w * h {
        if known[i] {
            continue;
        }
        let (x, y) = (i % w, i / w);
        if neighbours8(x, y, w, h).any(|j| known[j]) {
            queued[i] = true;
            arrival[i] = 1;
            queue.push_back(i);
        }
    }

    let r = radius.max(1) as isize;
    let r2 = (r * r) as f64;
    while let Some(i) = queue.pop_front() {
        let (x, y) = ((i % w) as isize, (i / w) as isize);
        let mut acc = 0.0;
        let mut weight_sum = 0.0;
        for dy in -r..=r {
            for dx in -r..=r {
                let (qx, qy) = (x + dx, y + dy);
                if (dx == 0 && dy == 0) || qx < 0 || qy < 0 || qx >= w as isize || qy >= h as isize {
                    continue;
                }
                let d2 = (dx * dx + dy * dy) as f64;
                let q = qy as usize * w + qx as usize;
                if d2 > r2 || !known[q] {
                    continue;
                }
                let level = 1.0 / (1.0 + arrival[i].abs_diff(arrival[q]) as f64);
                let weight = level / d2;
                acc += weight * values[q];
                weight_sum += weight;
            }
        }
        if weight_sum > 0.0 {
            values[i] = acc / weight_sum;
        }
        known[i] = true;

        for j in neighbours8(x as usize, y as usize, w, h) {
            if !queued[j] {
                queued[j] = true;
                arrival[j] = arrival[i] + 1;
                queue.push_back(j);
            }
        }
    }

    debug!(damaged, radius, "inpainted damaged pixels");
    Raster::from_buffer(w, h, values.into_iter().map(saturate_u8).collect())
}

fn neighbours8(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = usize> {
    (-1isize..=1)
        .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| {
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            (nx >= 0 && ny >= 0 && nx < w as isize && ny < h as isize).then(|| ny as usize * w + nx as usize)
        })
}
