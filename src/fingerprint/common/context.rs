//! Request-scoped state passed explicitly through a comparison.

use serde::Serialize;
use uuid::Uuid;

/// Identity of one comparison request. Artifact names derive from it, so
/// concurrent requests never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestContext {
    request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        Self { request_id: Uuid::new_v4() }
    }

    pub fn with_id(request_id: Uuid) -> Self {
        Self { request_id }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
