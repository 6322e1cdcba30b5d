use tracing::{info, instrument, warn};

use crate::fingerprint::analysis::{AnalysisResult, PatternAnalyzer};
use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::Raster;
use crate::fingerprint::common::timing::{StageTimings, Timer};
use crate::fingerprint::enhancement::{EnhancementResult, FingerprintEnhancer};
use crate::fingerprint::matching::MatchingEngine;
use crate::fingerprint::report::assembler::{ImageOutcome, assemble};
use crate::fingerprint::report::config::{ComparisonConfig, MatchInput};
use crate::fingerprint::report::types::ComparisonReport;
use crate::fingerprint::store::ArtifactStore;

/// End-to-end comparison of two rasters.
///
/// Both images are enhanced in parallel, then analyzed in parallel while the
/// matching engine runs on the selected pair. With [`MatchInput::Raw`] the
/// matcher does not wait for enhancement at all.
pub struct ComparisonPipeline<S: ArtifactStore> {
    enhancer: FingerprintEnhancer,
    analyzer: PatternAnalyzer,
    engine: MatchingEngine,
    store: S,
    config: ComparisonConfig,
}

impl<S: ArtifactStore> ComparisonPipeline<S> {
    pub fn new(config: ComparisonConfig, store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            enhancer: FingerprintEnhancer::new(config.enhancement.clone())?,
            analyzer: PatternAnalyzer::new(config.analysis.clone())?,
            engine: MatchingEngine::new(config.matching.clone())?,
            store,
            config,
        })
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn validate_dimensions(&self, raster: &Raster) -> Result<()> {
        let (width, height) = (raster.width(), raster.height());
        if width == 0 || height == 0 {
            return Err(FingerprintError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                warn!("Image dimensions {}x{} exceed maximum {}", width, height, max);
                return Err(FingerprintError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    /// Compares two rasters under a fresh request id.
    pub fn compare(&self, first: &Raster, second: &Raster) -> Result<ComparisonReport> {
        self.compare_with_context(first, second, &RequestContext::new())
    }

    #[instrument(skip_all, fields(request_id = %ctx.request_id()))]
    pub fn compare_with_context(
        &self,
        first: &Raster,
        second: &Raster,
        ctx: &RequestContext,
    ) -> Result<ComparisonReport> {
        let mut timings = StageTimings::new();
        info!(
            "Starting comparison: {}x{} vs {}x{}",
            first.width(),
            first.height(),
            second.width(),
            second.height()
        );

        let timer = Timer::start("validate_dimensions");
        self.validate_dimensions(first)?;
        self.validate_dimensions(second)?;
        let (name, duration) = timer.stop();
        timings.add_step(name, duration);

        let (outcome_a, outcome_b, match_result) = match self.config.match_input {
            MatchInput::Raw => {
                let ((run_a, run_b), match_result) = timings.time("enhance_analyze_match", || {
                    rayon::join(
                        || rayon::join(|| self.process(first), || self.process(second)),
                        || self.engine.compare(first, second, &self.store, ctx),
                    )
                });
                let (outcome_a, steps_a) = run_a?;
                let (outcome_b, steps_b) = run_b?;
                timings.extend_prefixed("first", &steps_a);
                timings.extend_prefixed("second", &steps_b);
                (outcome_a, outcome_b, match_result)
            }
            MatchInput::Enhanced => {
                let (enh_a, enh_b) = timings.time("enhance", || {
                    rayon::join(
                        || self.enhancer.enhance_with_timings(first),
                        || self.enhancer.enhance_with_timings(second),
                    )
                });
                let ((enh_a, steps_a), (enh_b, steps_b)) = (enh_a?, enh_b?);
                timings.extend_prefixed("first", &steps_a);
                timings.extend_prefixed("second", &steps_b);

                let ((analysis_a, analysis_b), match_result) = timings.time("analyze_match", || {
                    rayon::join(
                        || {
                            rayon::join(
                                || self.analyzer.analyze(&enh_a.enhanced),
                                || self.analyzer.analyze(&enh_b.enhanced),
                            )
                        },
                        || self.engine.compare(&enh_a.enhanced, &enh_b.enhanced, &self.store, ctx),
                    )
                });
                (
                    ImageOutcome { enhancement: enh_a, analysis: analysis_a? },
                    ImageOutcome { enhancement: enh_b, analysis: analysis_b? },
                    match_result,
                )
            }
        };

        let report = assemble(
            ctx.request_id(),
            outcome_a,
            outcome_b,
            match_result,
            &self.config.thresholds,
            timings,
        );

        info!(
            primary = report.match_result.primary_score(),
            secondary = report.match_result.secondary_score(),
            recommendation = %report.recommendation,
            "Comparison complete in {:.3}ms",
            report.timings.total_duration().as_secs_f64() * 1000.0
        );
        Ok(report)
    }

    /// Enhancement followed by analysis of the enhanced raster.
    fn process(&self, raster: &Raster) -> Result<(ImageOutcome, StageTimings)> {
        let (enhancement, mut steps): (EnhancementResult, StageTimings) =
            self.enhancer.enhance_with_timings(raster)?;
        let analysis: AnalysisResult = steps.time("analysis", || self.analyzer.analyze(&enhancement.enhanced))?;
        Ok((ImageOutcome { enhancement, analysis }, steps))
    }
}
