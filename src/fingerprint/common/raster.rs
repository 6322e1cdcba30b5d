//! Raster types shared by every pipeline stage.
//!
//! A [`Raster`] is an immutable 8-bit grayscale grid stored row-major. Stages
//! never mutate a raster they receive; they build and return a new one.

use image::{GrayImage, RgbImage};

use crate::fingerprint::common::error::{FingerprintError, Result};

/// Smallest width or height accepted by the core.
pub const MIN_DIMENSION: usize = 8;

/// Immutable 8-bit grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    image: GrayImage,
}

impl Raster {
    /// Builds a raster from a row-major sample buffer.
    ///
    /// Fails with `InvalidImage` on an empty or mis-sized buffer and with
    /// `InvalidDimensions` when either side is below [`MIN_DIMENSION`].
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(FingerprintError::InvalidImage("empty pixel buffer".to_string()));
        }
        if data.len() != width * height {
            return Err(FingerprintError::InvalidImage(format!(
                "buffer holds {} samples, expected {}x{}={}",
                data.len(),
                width,
                height,
                width * height
            )));
        }
        validate_dimensions(width, height)?;

        let image = GrayImage::from_raw(width as u32, height as u32, data).ok_or_else(|| {
            FingerprintError::InvalidImage(format!("cannot wrap {}x{} buffer", width, height))
        })?;
        Ok(Self { image })
    }

    /// Wraps an already decoded grayscale image.
    pub fn from_gray_image(image: GrayImage) -> Result<Self> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        if image.as_raw().is_empty() {
            return Err(FingerprintError::InvalidImage("empty image".to_string()));
        }
        validate_dimensions(width, height)?;
        Ok(Self { image })
    }

    /// Raster with every sample set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self> {
        Self::new(width, height, vec![value; width * height])
    }

    /// Internal constructor for stage outputs whose shape is known to match an
    /// already validated input.
    pub(crate) fn from_stage(image: GrayImage) -> Self {
        Self { image }
    }

    /// Builds a stage output of the same shape by applying `f` to every sample.
    pub(crate) fn map(&self, f: impl Fn(u8) -> u8) -> Self {
        let data = self.image.as_raw().iter().map(|&v| f(v)).collect();
        Self::from_buffer(self.width(), self.height(), data)
    }

    /// Same-shape stage output from a row-major buffer.
    ///
    /// # Panics
    ///
    /// When `data` does not hold exactly `width * height` samples.
    pub(crate) fn from_buffer(width: usize, height: usize, data: Vec<u8>) -> Self {
        let image = GrayImage::from_raw(width as u32, height as u32, data)
            .expect("stage output buffer must match the raster shape");
        Self { image }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    pub fn len(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major samples.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Sample at `(x, y)`, or `None` outside the raster.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width() && y < self.height() {
            Some(self.image.as_raw()[y * self.width() + x])
        } else {
            None
        }
    }

    /// Sample at `(x, y)` with coordinates clamped to the border.
    pub(crate) fn get_clamped(&self, x: isize, y: isize) -> u8 {
        let cx = x.clamp(0, self.width() as isize - 1) as usize;
        let cy = y.clamp(0, self.height() as isize - 1) as usize;
        self.image.as_raw()[cy * self.width() + cx]
    }

    pub fn as_gray_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_gray_image(self) -> GrayImage {
        self.image
    }
}

fn validate_dimensions(width: usize, height: usize) -> Result<()> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(FingerprintError::InvalidDimensions(width, height));
    }
    Ok(())
}

/// 8-bit RGB render, used for visualization artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbRaster {
    image: RgbImage,
}

impl RgbRaster {
    pub fn from_rgb_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Gray-to-RGB expansion of a raster, the usual canvas for overlays.
    pub fn from_raster(raster: &Raster) -> Self {
        let image = RgbImage::from_fn(raster.width() as u32, raster.height() as u32, |x, y| {
            let v = raster.as_gray_image().get_pixel(x, y).0[0];
            image::Rgb([v, v, v])
        });
        Self { image }
    }

    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    /// Interleaved `[R, G, B, R, G, B, ...]` samples.
    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.image
    }

    pub(crate) fn as_rgb_image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }
}
