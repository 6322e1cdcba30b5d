//! Secondary similarity from ridge-skeleton topology.
//!
//! Works on an entirely different representation than the keypoint matcher:
//! the raster is binarized and thinned to one-pixel ridges, short spurs are
//! pruned, ridge endings and bifurcations are read off the skeleton by
//! crossing number, and the two minutiae sets are aligned by translation
//! voting before being paired. The paired count is scored against what the
//! same sets would pair by chance.

use std::collections::HashMap;
use std::f64::consts::PI;

use imageproc::contrast::otsu_level;
use tracing::debug;

use crate::fingerprint::analysis::{MinutiaKind, MinutiaPoint, MinutiaeSet};
use crate::fingerprint::common::measure::safe_div;
use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::matching::config::MatchingConfig;

/// Translation candidates tried besides the identity.
const CANDIDATE_TRANSLATIONS: usize = 5;
/// Off-peak translations whose pairing estimates the chance level.
const DECOY_TRANSLATIONS: usize = 10;
const PAIRED_KINDS: [MinutiaKind; 2] = [MinutiaKind::Ending, MinutiaKind::Bifurcation];

/// An independent similarity measure reported next to the primary score.
pub trait SecondaryMatcher: Send + Sync {
    /// Similarity of two rasters in `[0, 100]`.
    fn similarity(&self, a: &Raster, b: &Raster) -> f64;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinutiaeTopologyMatcher {
    tolerance: f64,
    bin_size: f64,
    margin: usize,
    spur_length: usize,
    min_spacing: f64,
    max_minutiae: usize,
}

impl Default for MinutiaeTopologyMatcher {
    fn default() -> Self {
        Self::from_config(&MatchingConfig::default())
    }
}

/// Points bucketed on a square grid for radius queries.
struct PointGrid {
    cell: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl PointGrid {
    fn new(points: &[MinutiaPoint], cell: f64) -> Self {
        let cell = cell.max(1.0);
        let mut cells: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (i, p) in points.iter().enumerate() {
            cells.entry(Self::key(cell, p.x as f64, p.y as f64)).or_default().push(i);
        }
        Self { cell, cells }
    }

    fn key(cell: f64, x: f64, y: f64) -> (i64, i64) {
        ((x / cell).floor() as i64, (y / cell).floor() as i64)
    }

    /// Indices of every point within `cell` of `(x, y)`, plus some farther ones.
    fn near(&self, x: f64, y: f64) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = Self::key(self.cell, x, y);
        (-1..=1)
            .flat_map(move |dy| (-1..=1).map(move |dx| (cx + dx, cy + dy)))
            .filter_map(|k| self.cells.get(&k))
            .flatten()
            .copied()
    }
}

impl MinutiaeTopologyMatcher {
    pub fn new(tolerance: f64, bin_size: f64) -> Self {
        Self {
            tolerance,
            bin_size,
            margin: 5,
            spur_length: 6,
            min_spacing: 6.0,
            max_minutiae: 150,
        }
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(config.secondary_tolerance, config.secondary_bin_size)
    }

    pub fn max_minutiae(&self) -> usize {
        self.max_minutiae
    }

    pub fn min_spacing(&self) -> f64 {
        self.min_spacing
    }

    /// Skeleton minutiae after dropping crowded points, capped to the
    /// `max_minutiae` closest to the image centre.
    pub fn minutiae(&self, raster: &Raster) -> MinutiaeSet {
        let raw = skeleton_minutiae(raster, self.margin, self.spur_length);
        let mut points = drop_crowded(&raw, self.min_spacing);
        if points.len() > self.max_minutiae {
            let (cx, cy) = (raster.width() as f64 / 2.0, raster.height() as f64 / 2.0);
            let centre_dist = |p: &MinutiaPoint| (p.x as f64 - cx).powi(2) + (p.y as f64 - cy).powi(2);
            points.sort_by(|p, q| {
                centre_dist(p)
                    .total_cmp(&centre_dist(q))
                    .then((p.y, p.x).cmp(&(q.y, q.x)))
            });
            points.truncate(self.max_minutiae);
            points.sort_by_key(|p| (p.y, p.x));
        }
        MinutiaeSet::new(points)
    }

    /// Number of points of `a` that find a partner in `b` within the
    /// tolerance once `b` is shifted by `-(tx, ty)`. Each point of `b` pairs
    /// at most once.
    fn paired(&self, a: &[MinutiaPoint], b: &[MinutiaPoint], grid: &PointGrid, tx: f64, ty: f64) -> usize {
        let tol2 = self.tolerance * self.tolerance;
        let mut used = vec![false; b.len()];
        let mut count = 0;
        for p in a {
            let nearest = grid
                .near(p.x as f64 + tx, p.y as f64 + ty)
                .filter(|&j| !used[j])
                .map(|j| {
                    let dx = (b[j].x as f64 - tx) - p.x as f64;
                    let dy = (b[j].y as f64 - ty) - p.y as f64;
                    (j, dx * dx + dy * dy)
                })
                .filter(|&(_, d2)| d2 <= tol2)
                .min_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
            if let Some((j, _)) = nearest {
                used[j] = true;
                count += 1;
            }
        }
        count
    }

    fn paired_all(&self, a: &[Vec<MinutiaPoint>], b: &[Vec<MinutiaPoint>], grids: &[PointGrid], t: (f64, f64)) -> usize {
        a.iter()
            .zip(b)
            .zip(grids)
            .map(|((pa, pb), grid)| self.paired(pa, pb, grid, t.0, t.1))
            .sum()
    }

    /// Translation bins voted by same-kind pairs, strongest first, as
    /// bin-centre offsets.
    fn vote(&self, a: &[Vec<MinutiaPoint>], b: &[Vec<MinutiaPoint>]) -> Vec<(f64, f64)> {
        let mut votes: HashMap<(i64, i64), usize> = HashMap::new();
        for (pa, pb) in a.iter().zip(b) {
            for p in pa {
                for q in pb {
                    let bx = ((q.x - p.x) as f64 / self.bin_size).round() as i64;
                    let by = ((q.y - p.y) as f64 / self.bin_size).round() as i64;
                    *votes.entry((bx, by)).or_insert(0) += 1;
                }
            }
        }
        let mut bins: Vec<((i64, i64), usize)> = votes.into_iter().collect();
        bins.sort_by(|x, y| y.1.cmp(&x.1).then(x.0.cmp(&y.0)));
        bins.into_iter()
            .map(|((bx, by), _)| (bx as f64 * self.bin_size, by as f64 * self.bin_size))
            .collect()
    }

    /// Expected pairs between independent uniformly scattered sets of the
    /// given per-kind sizes, and the most pairs the sets allow.
    fn chance_pairs(&self, a: &[Vec<MinutiaPoint>], b: &[Vec<MinutiaPoint>], area: f64) -> (f64, f64) {
        let reach = PI * self.tolerance * self.tolerance;
        a.iter().zip(b).fold((0.0, 0.0), |(chance, ceiling), (pa, pb)| {
            let (na, nb) = (pa.len() as f64, pb.len() as f64);
            let from_a = na * (1.0 - (-nb * reach / area).exp());
            let from_b = nb * (1.0 - (-na * reach / area).exp());
            (chance + from_a.min(from_b), ceiling + na.min(nb))
        })
    }

    fn interior_area(&self, raster: &Raster) -> f64 {
        let frame = 2 * self.margin;
        (raster.width().saturating_sub(frame) * raster.height().saturating_sub(frame)).max(1) as f64
    }
}

impl SecondaryMatcher for MinutiaeTopologyMatcher {
    fn similarity(&self, a: &Raster, b: &Raster) -> f64 {
        let (ma, mb) = rayon::join(|| self.minutiae(a), || self.minutiae(b));
        if ma.is_empty() || mb.is_empty() {
            debug!(a = ma.len(), b = mb.len(), "no skeleton minutiae, secondary score 0");
            return 0.0;
        }

        let by_kind = |set: &MinutiaeSet| PAIRED_KINDS.map(|kind| set.of_kind(kind).copied().collect::<Vec<_>>());
        let (sa, sb) = (by_kind(&ma), by_kind(&mb));
        let grids: Vec<PointGrid> = sb.iter().map(|pb| PointGrid::new(pb, self.tolerance)).collect();

        let ranked = self.vote(&sa, &sb);
        let (best_t, best) = ranked
            .iter()
            .take(CANDIDATE_TRANSLATIONS)
            .copied()
            .chain(std::iter::once((0.0, 0.0)))
            .map(|t| (t, self.paired_all(&sa, &sb, &grids, t)))
            .fold(((0.0, 0.0), 0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });

        let exclusion = 2.0 * self.tolerance;
        let decoys: Vec<usize> = ranked
            .iter()
            .filter(|&&(tx, ty)| (tx - best_t.0).hypot(ty - best_t.1) > exclusion)
            .take(DECOY_TRANSLATIONS)
            .map(|&t| self.paired_all(&sa, &sb, &grids, t))
            .collect();
        let decoy_mean = safe_div(decoys.iter().sum::<usize>() as f64, decoys.len() as f64);

        let area = 0.5 * (self.interior_area(a) + self.interior_area(b));
        let (analytic, ceiling) = self.chance_pairs(&sa, &sb, area);
        let chance = analytic.max(decoy_mean);
        let score = if ceiling > chance {
            (best as f64 - chance) / (ceiling - chance) * 100.0
        } else {
            0.0
        };
        debug!(
            a = ma.len(),
            b = mb.len(),
            paired = best,
            chance,
            score,
            "topology compared"
        );
        if score.is_finite() { score.clamp(0.0, 100.0) } else { 0.0 }
    }

    fn name(&self) -> &'static str {
        "minutiae-topology"
    }
}

/// Ridge endings and bifurcations of the thinned and spur-pruned ridge map,
/// skipping a `margin` wide frame where the image border cuts ridges.
pub fn skeleton_minutiae(raster: &Raster, margin: usize, spur_length: usize) -> Vec<MinutiaPoint> {
    let (w, h) = (raster.width(), raster.height());
    let frame = margin.max(1);
    let mut grid = ridge_mask(raster);
    thin(&mut grid, w, h);
    prune_spurs(&mut grid, w, h, frame, spur_length);

    let mut points = Vec::new();
    for y in frame..h.saturating_sub(frame) {
        for x in frame..w.saturating_sub(frame) {
            if grid[y * w + x] == 0 {
                continue;
            }
            let around = ring(&grid, w, h, x, y);
            let kind = match transitions(&around) {
                1 => MinutiaKind::Ending,
                3 => MinutiaKind::Bifurcation,
                _ => continue,
            };
            points.push(MinutiaPoint {
                x: x as i32,
                y: y as i32,
                kind,
            });
        }
    }
    points
}

/// Drops every point that has another point closer than `spacing`.
pub(crate) fn drop_crowded(points: &[MinutiaPoint], spacing: f64) -> Vec<MinutiaPoint> {
    let grid = PointGrid::new(points, spacing);
    let spacing2 = spacing * spacing;
    points
        .iter()
        .enumerate()
        .filter(|&(i, p)| {
            !grid.near(p.x as f64, p.y as f64).any(|j| {
                let q = &points[j];
                let (dx, dy) = ((q.x - p.x) as f64, (q.y - p.y) as f64);
                j != i && dx * dx + dy * dy < spacing2
            })
        })
        .map(|(_, p)| *p)
        .collect()
}

/// Otsu binarization with the minority class taken as ridge foreground (1).
pub(crate) fn ridge_mask(raster: &Raster) -> Vec<u8> {
    let level = otsu_level(raster.as_gray_image());
    let bright = raster.pixels().iter().filter(|&&v| v > level).count();
    let ridges_bright = bright * 2 <= raster.len();
    raster
        .pixels()
        .iter()
        .map(|&v| u8::from((v > level) == ridges_bright))
        .collect()
}

/// Zhang-Suen thinning of a 0/1 grid, in place.
pub(crate) fn thin(grid: &mut [u8], w: usize, h: usize) {
    let mut to_clear = Vec::new();
    loop {
        let mut changed = false;
        for step in 0..2 {
            to_clear.clear();
            for y in 0..h {
                for x in 0..w {
                    if grid[y * w + x] == 0 {
                        continue;
                    }
                    let p = ring(grid, w, h, x, y);
                    let neighbours: u8 = p.iter().sum();
                    if !(2..=6).contains(&neighbours) || transitions(&p) != 1 {
                        continue;
                    }
                    // p[0]=N p[2]=E p[4]=S p[6]=W
                    let removable = if step == 0 {
                        p[0] * p[2] * p[4] == 0 && p[2] * p[4] * p[6] == 0
                    } else {
                        p[0] * p[2] * p[6] == 0 && p[0] * p[4] * p[6] == 0
                    };
                    if removable {
                        to_clear.push(y * w + x);
                    }
                }
            }
            changed |= !to_clear.is_empty();
            for &i in &to_clear {
                grid[i] = 0;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Peels skeleton end pixels `length` times, removing branches and islands
/// shorter than that. Pixels inside the `frame` are never peeled, so ridges
/// cut by the border stay anchored.
pub(crate) fn prune_spurs(grid: &mut [u8], w: usize, h: usize, frame: usize, length: usize) {
    let mut ends = Vec::new();
    for _ in 0..length {
        ends.clear();
        for y in frame..h.saturating_sub(frame) {
            for x in frame..w.saturating_sub(frame) {
                if grid[y * w + x] == 0 {
                    continue;
                }
                let p = ring(grid, w, h, x, y);
                let neighbours: u8 = p.iter().sum();
                if neighbours == 0 || (neighbours <= 3 && transitions(&p) == 1) {
                    ends.push(y * w + x);
                }
            }
        }
        if ends.is_empty() {
            break;
        }
        for &i in &ends {
            grid[i] = 0;
        }
    }
}

/// The 8 neighbours clockwise from north; outside the grid reads as 0.
fn ring(grid: &[u8], w: usize, h: usize, x: usize, y: usize) -> [u8; 8] {
    const OFFSETS: [(isize, isize); 8] = [(0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1)];
    let mut out = [0u8; 8];
    for (o, (dx, dy)) in out.iter_mut().zip(OFFSETS) {
        let (nx, ny) = (x as isize + dx, y as isize + dy);
        if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
            *o = grid[ny as usize * w + nx as usize];
        }
    }
    out
}

/// 0-to-1 transitions around the ring, i.e. the crossing number.
fn transitions(ring: &[u8; 8]) -> usize {
    (0..8).filter(|&i| ring[i] == 0 && ring[(i + 1) % 8] == 1).count()
}
