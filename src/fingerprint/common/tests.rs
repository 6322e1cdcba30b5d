use uuid::Uuid;

use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::raster::Raster;

#[test]
fn test_from_buffer_keeps_samples() {
    let raster = Raster::from_buffer(3, 2, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!((raster.width(), raster.height()), (3, 2));
    assert_eq!(raster.get(2, 1), Some(6));
}

#[test]
#[should_panic(expected = "stage output buffer must match the raster shape")]
fn test_from_buffer_rejects_short_buffer() {
    let _ = Raster::from_buffer(4, 4, vec![0; 15]);
}

#[test]
fn test_request_context_with_id() {
    let id = Uuid::from_u128(7);
    assert_eq!(RequestContext::with_id(id).request_id(), id);
    assert_ne!(RequestContext::new().request_id(), RequestContext::new().request_id());
}
