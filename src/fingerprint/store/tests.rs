use tempfile::TempDir;

use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::raster::{Raster, RgbRaster};
use crate::fingerprint::store::{
    ArtifactKind, ArtifactStore, MemoryArtifactStore, TiffArtifactStore, TiffCompression,
};

fn render(width: usize, height: usize) -> RgbRaster {
    let data = (0..width * height).map(|i| (i % 251) as u8).collect();
    RgbRaster::from_raster(&Raster::new(width, height, data).unwrap())
}

fn decode(path: &std::path::Path) -> (u32, u32, Vec<u8>) {
    let file = std::fs::File::open(path).unwrap();
    let mut decoder = tiff::decoder::Decoder::new(std::io::BufReader::new(file)).unwrap();
    let (width, height) = decoder.dimensions().unwrap();
    match decoder.read_image().unwrap() {
        tiff::decoder::DecodingResult::U8(data) => (width, height, data),
        _ => panic!("expected 8-bit samples"),
    }
}

#[test]
fn test_tiff_store_names_files_by_request() {
    let dir = TempDir::new().unwrap();
    let store = TiffArtifactStore::new(dir.path()).unwrap();
    let ctx = RequestContext::new();

    let reference = store.store(&ctx, ArtifactKind::MatchOverlay, &render(24, 16)).unwrap();
    let expected = dir.path().join(format!("{}_match_overlay.tiff", ctx.request_id()));

    assert_eq!(reference.as_str(), expected.to_string_lossy());
    assert!(expected.exists());
}

#[test]
fn test_tiff_store_writes_rgb_pixels() {
    let dir = TempDir::new().unwrap();
    let image = render(20, 12);

    for compression in [TiffCompression::None, TiffCompression::Lzw, TiffCompression::Deflate] {
        let store = TiffArtifactStore::new(dir.path()).unwrap().with_compression(compression);
        let ctx = RequestContext::new();
        store.store(&ctx, ArtifactKind::MinutiaeA, &image).unwrap();

        let path = dir.path().join(TiffArtifactStore::file_name(&ctx, ArtifactKind::MinutiaeA));
        let (width, height, data) = decode(&path);
        assert_eq!((width, height), (20, 12));
        assert_eq!(data, image.data());
    }
}

#[test]
fn test_tiff_store_creates_missing_root() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("renders").join("today");
    let store = TiffArtifactStore::new(&nested).unwrap();
    assert!(store.root().is_dir());
}

#[test]
fn test_concurrent_requests_do_not_collide() {
    let dir = TempDir::new().unwrap();
    let store = TiffArtifactStore::new(dir.path()).unwrap();
    let (first, second) = (RequestContext::new(), RequestContext::new());

    let a = store.store(&first, ArtifactKind::MinutiaeB, &render(8, 8)).unwrap();
    let b = store.store(&second, ArtifactKind::MinutiaeB, &render(8, 8)).unwrap();

    assert_ne!(a, b);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_memory_store_round_trip() {
    let store = MemoryArtifactStore::new();
    let ctx = RequestContext::new();
    let image = render(10, 9);

    let reference = store.store(&ctx, ArtifactKind::MinutiaeA, &image).unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&reference), Some(image));
    assert!(reference.as_str().contains(&ctx.request_id().to_string()));
}
