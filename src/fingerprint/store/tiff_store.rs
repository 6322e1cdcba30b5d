use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fingerprint::common::context::RequestContext;
use crate::fingerprint::common::error::{FingerprintError, Result};
use crate::fingerprint::common::raster::RgbRaster;
use crate::fingerprint::store::types::{ArtifactKind, ArtifactRef, TiffCompression};
use crate::fingerprint::store::writer::ArtifactStore;

/// Writes each artifact as an RGB8 TIFF named `{request_id}_{kind}.tiff`
/// under a root directory.
#[derive(Debug, Clone)]
pub struct TiffArtifactStore {
    root: PathBuf,
    compression: TiffCompression,
}

impl TiffArtifactStore {
    /// Uses `root` as the output directory, creating it when missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            compression: TiffCompression::None,
        })
    }

    pub fn with_compression(mut self, compression: TiffCompression) -> Self {
        self.compression = compression;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(ctx: &RequestContext, kind: ArtifactKind) -> String {
        format!("{}_{}.tiff", ctx.request_id(), kind.slug())
    }

    /// Encodes `image` as TIFF into `output`.
    pub fn encode(&self, image: &RgbRaster, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding TIFF artifact: {}x{}", image.width(), image.height());

        let mut buffer = Vec::new();
        let compression = match self.compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::Deflate => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Balanced,
            ),
        };

        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| FingerprintError::ArtifactStore(e.to_string()))?
            .with_compression(compression);

        encoder
            .write_image::<tiff::encoder::colortype::RGB8>(
                image.width() as u32,
                image.height() as u32,
                image.data(),
            )
            .map_err(|e| FingerprintError::ArtifactStore(e.to_string()))?;

        output.write_all(&buffer)?;
        Ok(())
    }
}

impl ArtifactStore for TiffArtifactStore {
    fn store(&self, ctx: &RequestContext, kind: ArtifactKind, image: &RgbRaster) -> Result<ArtifactRef> {
        let path = self.root.join(Self::file_name(ctx, kind));
        let file = File::create(&path).map_err(|e| {
            FingerprintError::ArtifactStore(format!("{}: {}", path.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        self.encode(image, &mut writer)?;
        writer.flush()?;

        debug!(path = %path.display(), %kind, "artifact written");
        Ok(ArtifactRef::new(path.to_string_lossy()))
    }
}
