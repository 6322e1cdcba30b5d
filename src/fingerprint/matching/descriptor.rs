use rayon::prelude::*;

use crate::fingerprint::matching::types::{Descriptor, Feature, FeatureMatch};

pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Brute-force nearest-neighbour matcher over Hamming distance.
///
/// A nearest neighbour is accepted when it is within `max_distance` and
/// clearly closer than the runner-up (`best < ratio * second`). Each train
/// feature is used at most once; when several queries pick it, the closest
/// wins.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorMatcher {
    ratio: f64,
    max_distance: u32,
}

impl DescriptorMatcher {
    pub fn new(ratio: f64, max_distance: u32) -> Self {
        Self { ratio, max_distance }
    }

    pub fn match_features(&self, query: &[Feature], train: &[Feature]) -> Vec<FeatureMatch> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<FeatureMatch> = query
            .par_iter()
            .enumerate()
            .filter_map(|(query_idx, q)| {
                let mut best = (u32::MAX, 0usize);
                let mut second = u32::MAX;
                for (train_idx, t) in train.iter().enumerate() {
                    let d = hamming_distance(&q.descriptor, &t.descriptor);
                    if d < best.0 {
                        second = best.0;
                        best = (d, train_idx);
                    } else if d < second {
                        second = d;
                    }
                }
                self.accept(best.0, second).then_some(FeatureMatch {
                    query_idx,
                    train_idx: best.1,
                    distance: best.0,
                })
            })
            .collect();

        candidates.sort_by_key(|m| (m.distance, m.query_idx));
        let mut taken = vec![false; train.len()];
        let mut accepted: Vec<FeatureMatch> = candidates
            .into_iter()
            .filter(|m| !std::mem::replace(&mut taken[m.train_idx], true))
            .collect();
        accepted.sort_by_key(|m| m.query_idx);
        accepted
    }

    fn accept(&self, best: u32, second: u32) -> bool {
        if best > self.max_distance {
            return false;
        }
        // A lone train feature has no runner-up to compare against.
        if second == u32::MAX {
            return true;
        }
        if second == 0 {
            return false;
        }
        (best as f64) < self.ratio * second as f64
    }
}
