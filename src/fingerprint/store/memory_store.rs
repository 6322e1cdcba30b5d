use std::collections::HashMap;
use std::sync::Mutex;

use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::RgbRaster;
use crate::fingerprint::store::types::{ArtifactKind, ArtifactRef};
use crate::fingerprint::store::writer::ArtifactStore;

/// Keeps artifacts in process memory, keyed by reference.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<HashMap<ArtifactRef, RgbRaster>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &ArtifactRef) -> Option<RgbRaster> {
        self.artifacts.lock().ok()?.get(reference).cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn store(&self, ctx: &RequestContext, kind: ArtifactKind, image: &RgbRaster) -> Result<ArtifactRef> {
        let reference = ArtifactRef::new(format!("mem://{}/{}", ctx.request_id(), kind.slug()));
        self.artifacts
            .lock()
            .map_err(|_| FingerprintError::ArtifactStore("memory store lock poisoned".into()))?
            .insert(reference.clone(), image.clone());
        Ok(reference)
    }
}
