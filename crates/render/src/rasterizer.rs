//! Dense driver: evaluates a coverage source at every pixel center.
//!
//! Rows are independent, so they run on the rayon pool the caller installs.
//! Cancellation is polled once per row.

use glam::DVec2;
use halftone_core::{ChannelView, Coverage, Field, HalftoneError, HalftoneField, Ink, Pattern, PatternField, Raster};
use rayon::prelude::*;

use crate::cancel::CancelToken;

/// Fills a `width x height` coverage plane from `source`, row-parallel.
pub fn fill_dense(
    source: &dyn Coverage,
    width: usize,
    height: usize,
    cancel: &CancelToken,
) -> Result<Field, HalftoneError> {
    let len = width
        .checked_mul(height)
        .filter(|&n| n > 0)
        .ok_or(HalftoneError::InvalidDimensions)?;
    let mut data = vec![0.0; len];
    data.par_chunks_mut(width)
        .enumerate()
        .try_for_each(|(y, row)| {
            cancel.check()?;
            let py = y as f64 + 0.5;
            for (x, out) in row.iter_mut().enumerate() {
                *out = source.coverage_at(DVec2::new(x as f64 + 0.5, py));
            }
            Ok::<(), HalftoneError>(())
        })?;
    Field::from_data(width, height, data)
}

/// Screens one ink channel of `image` through the pattern field.
pub fn rasterize_channel(
    image: &Raster,
    ink: &Ink,
    pattern: Pattern,
    cancel: &CancelToken,
) -> Result<Field, HalftoneError> {
    let (width, height) = (image.width(), image.height());
    let field = PatternField::for_ink(width, height, ink, pattern);
    let halftone = HalftoneField::new(field, ChannelView::new(image, ink.separation));
    let plane = fill_dense(&halftone, width, height, cancel)?;
    log::debug!(
        "rasterized {} ({pattern}, cell {:.2}px, angle {:.1})",
        ink.label,
        field.cell_size(),
        ink.angle
    );
    Ok(plane)
}
