//! Enhancement pipeline
//!
//! Turns a raw grayscale fingerprint raster into a ridge-emphasized one and
//! reports how much the image changed. Stages, in order: contrast
//! normalization, denoising, ridge enhancement, damage restoration, edge
//! fusion, output tone normalization. Every stage is a pure raster-to-raster
//! function and can be used on its own.

pub mod contrast;
pub mod denoise;
pub mod edges;
pub mod metrics;
pub mod restoration;
pub mod ridges;
pub mod tone;
mod pipeline;
mod types;


pub use pipeline::FingerprintEnhancer;
pub use types::{
    EnhancementConfig, EnhancementConfigBuilder, EnhancementMetrics, EnhancementResult,
    GaborParams, StageToggles,
};
