use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::error::Result;
use crate::fingerprint::common::raster::RgbRaster;
use crate::fingerprint::store::types::{ArtifactKind, ArtifactRef};

/// Narrow write interface used to persist visualization renders.
///
/// Implementations must derive names from the request context so that
/// concurrent requests sharing one store never overwrite each other.
pub trait ArtifactStore: Send + Sync {
    fn store(&self, ctx: &RequestContext, kind: ArtifactKind, image: &RgbRaster) -> Result<ArtifactRef>;
}
