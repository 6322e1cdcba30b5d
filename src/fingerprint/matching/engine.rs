use tracing::{debug, info, instrument, warn};

use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::error::Result;
use crate::fingerprint::common::raster::{Raster, RgbRaster};
use crate::fingerprint::matching::config::MatchingConfig;
use crate::fingerprint::matching::descriptor::DescriptorMatcher;
use crate::fingerprint::matching::orb::{FeatureDetector, OrbDetector};
use crate::fingerprint::matching::secondary::{MinutiaeTopologyMatcher, SecondaryMatcher};
use crate::fingerprint::matching::types::{
    Feature, FeatureMatch, MatchResult, VisualizationRefs, primary_score,
};
use crate::fingerprint::matching::visualize::{draw_keypoints, draw_matches};
use crate::fingerprint::store::{ArtifactKind, ArtifactRef, ArtifactStore};

/// Pairwise comparison: keypoint matching for the primary score, an
/// independent matcher for the secondary one, and overlay renders.
pub struct MatchingEngine<D = OrbDetector, S = MinutiaeTopologyMatcher>
where
    D: FeatureDetector,
    S: SecondaryMatcher,
{
    detector: D,
    secondary: S,
    matcher: DescriptorMatcher,
    config: MatchingConfig,
}

impl MatchingEngine<OrbDetector, MinutiaeTopologyMatcher> {
    pub fn new(config: MatchingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_custom(
            OrbDetector::new(config.clone()),
            MinutiaeTopologyMatcher::from_config(&config),
            config,
        ))
    }
}

impl<D, S> MatchingEngine<D, S>
where
    D: FeatureDetector,
    S: SecondaryMatcher,
{
    pub fn with_custom(detector: D, secondary: S, config: MatchingConfig) -> Self {
        Self {
            detector,
            secondary,
            matcher: DescriptorMatcher::new(config.ratio_threshold, config.max_hamming_distance),
            config,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Compares `a` against `b`. A pair without keypoints on either side is a
    /// valid zero-scored result; a store failure only drops the affected
    /// visualization reference.
    #[instrument(skip_all, fields(request_id = %ctx.request_id(), detector = self.detector.name()))]
    pub fn compare(
        &self,
        a: &Raster,
        b: &Raster,
        store: &dyn ArtifactStore,
        ctx: &RequestContext,
    ) -> MatchResult {
        let ((features_a, features_b), secondary_score) = rayon::join(
            || {
                let _span = tracing::info_span!("detect").entered();
                rayon::join(|| self.detector.detect(a), || self.detector.detect(b))
            },
            || {
                let _span = tracing::info_span!("secondary", matcher = self.secondary.name()).entered();
                self.secondary.similarity(a, b)
            },
        );

        let (count_a, count_b) = (features_a.len(), features_b.len());
        let (matches, result) = if count_a == 0 || count_b == 0 {
            debug!(count_a, count_b, "unmatchable feature set");
            (Vec::new(), MatchResult::unmatchable(count_a, count_b, secondary_score))
        } else {
            let matches = {
                let _span = tracing::info_span!("match").entered();
                self.matcher.match_features(&features_a, &features_b)
            };
            let good = matches.len();
            let result = MatchResult::new(
                primary_score(good, count_a, count_b),
                secondary_score,
                count_a,
                count_b,
                good,
                VisualizationRefs::default(),
            );
            (matches, result)
        };

        info!(
            keypoints_a = count_a,
            keypoints_b = count_b,
            good_matches = result.good_match_count(),
            primary = result.primary_score(),
            secondary = result.secondary_score(),
            "Matching complete"
        );

        if !self.config.render_visualizations {
            return result;
        }
        let refs = {
            let _span = tracing::info_span!("visualize").entered();
            self.render(a, &features_a, b, &features_b, &matches, store, ctx)
        };
        result.with_visualizations(refs)
    }

    #[allow(clippy::too_many_arguments)]
    fn render(
        &self,
        a: &Raster,
        features_a: &[Feature],
        b: &Raster,
        features_b: &[Feature],
        matches: &[FeatureMatch],
        store: &dyn ArtifactStore,
        ctx: &RequestContext,
    ) -> VisualizationRefs {
        VisualizationRefs {
            minutiae_a: persist(store, ctx, ArtifactKind::MinutiaeA, &draw_keypoints(a, features_a)),
            minutiae_b: persist(store, ctx, ArtifactKind::MinutiaeB, &draw_keypoints(b, features_b)),
            match_overlay: persist(
                store,
                ctx,
                ArtifactKind::MatchOverlay,
                &draw_matches(a, features_a, b, features_b, matches),
            ),
        }
    }
}

fn persist(
    store: &dyn ArtifactStore,
    ctx: &RequestContext,
    kind: ArtifactKind,
    image: &RgbRaster,
) -> Option<ArtifactRef> {
    match store.store(ctx, kind, image) {
        Ok(reference) => Some(reference),
        Err(e) => {
            warn!(%kind, error = %e, "failed to store visualization");
            None
        }
    }
}
