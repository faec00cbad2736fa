//! RGBA8 pixel buffers used for both the source image and rendered output.

use crate::color::Srgb;
use crate::error::HalftoneError;

/// An RGBA8 image in row-major order.
///
/// The engine treats a source `Raster` as immutable for the whole session;
/// output rasters are built by a single pass and handed out only once the
/// pass has finished.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// Wraps an RGBA8 buffer, validating that it holds `width * height * 4` bytes.
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, HalftoneError> {
        let expected = Self::byte_len(width, height)?;
        if pixels.len() != expected {
            return Err(HalftoneError::DimensionMismatch {
                expected,
                got: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Creates a raster where every pixel has the given color and alpha.
    pub fn filled(width: usize, height: usize, color: Srgb, alpha: f64) -> Result<Self, HalftoneError> {
        let len = Self::byte_len(width, height)?;
        let [r, g, b] = color.to_u8();
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut pixels = Vec::with_capacity(len);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[r, g, b, a]);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn byte_len(width: usize, height: usize) -> Result<usize, HalftoneError> {
        if width == 0 || height == 0 {
            return Err(HalftoneError::InvalidDimensions);
        }
        width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or(HalftoneError::InvalidDimensions)
    }

    /// Raster width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the raster and returns the RGBA8 bytes.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// The RGBA bytes of pixel `(x, y)`. Coordinates are clamped to the image.
    pub fn rgba(&self, x: usize, y: usize) -> [u8; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let i = (y * self.width + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// The color of pixel `(x, y)` with alpha discarded. Coordinates are clamped.
    pub fn color(&self, x: usize, y: usize) -> Srgb {
        let [r, g, b, _] = self.rgba(x, y);
        Srgb::from_u8(r, g, b)
    }

    /// Nearest-neighbor lookup at a continuous image-space position,
    /// clamped to the image bounds.
    pub fn sample(&self, px: f64, py: f64) -> Srgb {
        let clamp_axis = |v: f64, len: usize| -> usize {
            if v.is_nan() || v <= 0.0 {
                0
            } else {
                (v.floor() as usize).min(len - 1)
            }
        };
        self.color(clamp_axis(px, self.width), clamp_axis(py, self.height))
    }

    /// Whether a continuous position lies inside `[0, width) x [0, height)`.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= 0.0 && py >= 0.0 && px < self.width as f64 && py < self.height as f64
    }
}
