//! Artifact store module
//!
//! The narrow write interface through which visualization renders leave the
//! core, plus a TIFF-on-disk and an in-memory implementation.

mod memory_store;
mod tiff_store;
mod types;
mod writer;

#[cfg(test)]
mod tests;

pub use memory_store::MemoryArtifactStore;
pub use tiff_store::TiffArtifactStore;
pub use types::{ArtifactKind, ArtifactRef, TiffCompression};
pub use writer::ArtifactStore;
