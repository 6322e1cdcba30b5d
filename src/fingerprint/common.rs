//! Common utilities module
//!
//! Raster types, the error taxonomy and the numeric helpers shared by the
//! enhancement, analysis and matching stages.

pub mod context;
pub mod error;
pub mod raster;
pub mod measure;
pub mod timing;

#[cfg(test)]
mod tests;

pub use context::RequestContext;
pub use error::{FingerprintError, Result};
pub use raster::{Raster, RgbRaster, MIN_DIMENSION};
pub use timing::{StageTimings, StepTiming, Timer};
