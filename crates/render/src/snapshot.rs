//! PNG output and the print-resolution upscale.
//!
//! This module is feature-gated behind `png` (default on) so library users
//! that only need rasters or SVG do not pull in the `image` crate.

use std::path::Path;

use halftone_core::{HalftoneError, Raster};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::pixel::plate_to_rgba;
use crate::Plate;

/// Integer scale applied by [`upscale_for_print`].
pub const PRINT_SCALE: u32 = 2;

fn dimensions(width: usize, height: usize) -> Result<(u32, u32), HalftoneError> {
    let w = u32::try_from(width).map_err(|_| HalftoneError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| HalftoneError::InvalidDimensions)?;
    Ok((w, h))
}

/// Copies a raster into an `image` buffer.
pub fn to_image(raster: &Raster) -> Result<RgbaImage, HalftoneError> {
    let (w, h) = dimensions(raster.width(), raster.height())?;
    RgbaImage::from_raw(w, h, raster.pixels().to_vec())
        .ok_or_else(|| HalftoneError::Io("RGBA buffer size mismatch".into()))
}

/// Wraps a decoded `image` buffer as a source raster.
pub fn from_image(image: RgbaImage) -> Result<Raster, HalftoneError> {
    let (w, h) = image.dimensions();
    Raster::from_rgba(w as usize, h as usize, image.into_raw())
}

/// Writes a raster as a PNG image.
///
/// Returns `HalftoneError::InvalidDimensions` if the raster dimensions
/// overflow `u32`, or `HalftoneError::Io` on write failure.
pub fn write_png(raster: &Raster, path: &Path) -> Result<(), HalftoneError> {
    to_image(raster)?
        .save(path)
        .map_err(|e| HalftoneError::Io(e.to_string()))
}

/// Writes one separation plate as ink on white.
pub fn write_plate_png(plate: &Plate, path: &Path) -> Result<(), HalftoneError> {
    let coverage = &plate.coverage;
    let (w, h) = dimensions(coverage.width(), coverage.height())?;
    let img = RgbaImage::from_raw(w, h, plate_to_rgba(coverage, plate.color))
        .ok_or_else(|| HalftoneError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| HalftoneError::Io(e.to_string()))
}

/// Scales an already rendered raster by [`PRINT_SCALE`] with bilinear filtering.
///
/// This resamples finished pixels; it does not re-screen at a higher
/// density, so dot edges soften rather than sharpen.
pub fn upscale_for_print(raster: &Raster) -> Result<Raster, HalftoneError> {
    let img = to_image(raster)?;
    let (w, h) = img.dimensions();
    let (sw, sh) = w
        .checked_mul(PRINT_SCALE)
        .zip(h.checked_mul(PRINT_SCALE))
        .ok_or(HalftoneError::InvalidDimensions)?;
    from_image(imageops::resize(&img, sw, sh, FilterType::Triangle))
}
