//! Sparse driver: one explicit shape per visible lattice center.
//!
//! [`enumerate_dots`] is the single source of dot placement. The grid
//! sampler stamps its dots into a coverage plane and the SVG exporter turns
//! the same dots into shape elements, so the two outputs cannot drift.

use glam::DVec2;
use halftone_core::{ChannelView, Coverage, Dot, DotShape, Field, GridTransform, HalftoneError, Ink, InkSampler, Pattern, Raster};
use rayon::prelude::*;

use crate::cancel::CancelToken;

/// Dots with less ink than this are not drawn.
pub const VISIBILITY_THRESHOLD: f64 = 0.02;
/// Smallest lattice cell the grid sampler will use, in pixels.
pub const MIN_CELL_SIZE: f64 = 2.0;
/// Dots stamped between cancellation checks.
const CANCEL_STRIDE: usize = 256;

/// Lattice cell size in pixels for `frequency` cells across `width`.
pub fn grid_cell_size(width: usize, frequency: f64) -> f64 {
    (width as f64 / frequency).max(MIN_CELL_SIZE)
}

/// Every visible dot of one channel, in row-major lattice order.
///
/// Lattice rows are evaluated in parallel and collected in order, so the
/// result is deterministic. Centers that land outside the image are
/// dropped.
pub fn enumerate_dots(image: &Raster, ink: &Ink, cancel: &CancelToken) -> Result<Vec<Dot>, HalftoneError> {
    let cell = grid_cell_size(image.width(), ink.frequency);
    let transform = GridTransform::new(image.width() as f64, image.height() as f64, cell, ink.angle);
    let ((i0, i1), (j0, j1)) = transform.lattice_bounds();
    let view = ChannelView::new(image, ink.separation);
    let scale = ink.size / 100.0;

    let rows = (j0..=j1)
        .into_par_iter()
        .map(|j| -> Result<Vec<Dot>, HalftoneError> {
            cancel.check()?;
            let mut row = Vec::new();
            for i in i0..=i1 {
                let center = transform.cell(i, j).image_center;
                if !image.contains(center.x, center.y) {
                    continue;
                }
                let intensity = view.ink_at(center);
                if intensity < VISIBILITY_THRESHOLD {
                    continue;
                }
                row.push(Dot {
                    x: center.x,
                    y: center.y,
                    radius: cell * 0.5 * intensity.sqrt() * scale,
                });
            }
            Ok(row)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().flatten().collect())
}

/// Screens one ink channel of `image` by stamping explicit dot shapes.
pub fn sample_channel(
    image: &Raster,
    ink: &Ink,
    pattern: Pattern,
    cancel: &CancelToken,
) -> Result<Field, HalftoneError> {
    let dots = enumerate_dots(image, ink, cancel)?;
    let shape = DotShape::new(pattern, grid_cell_size(image.width(), ink.frequency), ink.angle);
    let mut plane = Field::new(image.width(), image.height())?;
    for (n, dot) in dots.iter().enumerate() {
        if n % CANCEL_STRIDE == 0 {
            cancel.check()?;
        }
        stamp(&mut plane, &shape.place(*dot), dot.center(), shape.extent(dot));
    }
    log::debug!("sampled {}: {} dots", ink.label, dots.len());
    Ok(plane)
}

/// Unions a coverage source into the pixels within `extent` of `center`.
fn stamp(plane: &mut Field, source: &dyn Coverage, center: DVec2, extent: f64) {
    let (w, h) = (plane.width() as f64, plane.height() as f64);
    let x0 = (center.x - extent).floor().clamp(0.0, w) as usize;
    let x1 = (center.x + extent).ceil().clamp(0.0, w) as usize;
    let y0 = (center.y - extent).floor().clamp(0.0, h) as usize;
    let y1 = (center.y + extent).ceil().clamp(0.0, h) as usize;
    for y in y0..y1 {
        for x in x0..x1 {
            let a = source.coverage_at(DVec2::new(x as f64 + 0.5, y as f64 + 0.5));
            if a > 0.0 {
                plane.accumulate(x, y, a);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halftone_core::{Process, Separation, Srgb};

    fn key_ink(frequency: f64, angle: f64) -> Ink {
        Ink {
            label: "key",
            separation: Separation::Process(Process::Key),
            angle,
            frequency,
            size: 100.0,
            color: Srgb::BLACK,
        }
    }

    fn gray(width: usize, height: usize, level: u8) -> Raster {
        Raster::filled(width, height, Srgb::from_u8(level, level, level), 1.0).unwrap()
    }

    #[test]
    fn cell_size_is_clamped() {
        assert_eq!(grid_cell_size(100, 10.0), 10.0);
        assert_eq!(grid_cell_size(10, 100.0), MIN_CELL_SIZE);
    }

    #[test]
    fn black_image_yields_full_dots_on_the_lattice() {
        let image = gray(40, 20, 0);
        let dots = enumerate_dots(&image, &key_ink(4.0, 0.0), &CancelToken::new()).unwrap();
        // Cell 10: centers at 5, 15, 25, 35 across and 5, 15 down.
        assert_eq!(dots.len(), 8);
        assert_eq!((dots[0].x, dots[0].y), (5.0, 5.0));
        assert_eq!((dots[1].x, dots[1].y), (15.0, 5.0));
        assert!(dots.iter().all(|d| (d.radius - 5.0).abs() < 1e-9));
    }

    #[test]
    fn radius_follows_square_root_of_intensity() {
        // Gray 191 gives key = 1 - 191/255, roughly 0.25.
        let image = gray(20, 20, 191);
        let dots = enumerate_dots(&image, &key_ink(2.0, 0.0), &CancelToken::new()).unwrap();
        let k = 1.0 - 191.0 / 255.0;
        assert!(dots.iter().all(|d| (d.radius - 10.0 * 0.5 * f64::sqrt(k)).abs() < 1e-9));
    }

    #[test]
    fn faint_ink_is_skipped() {
        let image = gray(20, 20, 252);
        let dots = enumerate_dots(&image, &key_ink(2.0, 0.0), &CancelToken::new()).unwrap();
        assert!(dots.is_empty());
    }

    #[test]
    fn rotated_lattice_reaches_every_corner() {
        let image = gray(60, 60, 0);
        let dots = enumerate_dots(&image, &key_ink(6.0, 45.0), &CancelToken::new()).unwrap();
        for corner in [DVec2::new(3.0, 3.0), DVec2::new(57.0, 57.0), DVec2::new(3.0, 57.0)] {
            let nearest = dots
                .iter()
                .map(|d| (d.center() - corner).length())
                .fold(f64::INFINITY, f64::min);
            assert!(nearest < 18.0, "no dot near {corner}");
        }
        assert!(dots.iter().all(|d| image.contains(d.x, d.y)));
    }

    #[test]
    fn enumeration_is_deterministic() {
        let image = gray(64, 48, 40);
        let ink = key_ink(7.0, 33.0);
        let a = enumerate_dots(&image, &ink, &CancelToken::new()).unwrap();
        let b = enumerate_dots(&image, &ink, &CancelToken::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sampled_plane_covers_dot_centers_only() {
        let image = gray(40, 40, 0);
        let plane = sample_channel(&image, &key_ink(4.0, 0.0), Pattern::Circle, &CancelToken::new()).unwrap();
        assert!(plane.get(5, 5).unwrap() > 0.99);
        // Corner between four r=5 circles touching at cell edges.
        assert_eq!(plane.get(0, 0), Some(0.0));
    }

    #[test]
    fn dots_agree_with_the_pattern_field_lattice() {
        let image = gray(48, 48, 0);
        let ink = key_ink(6.0, 15.0);
        let field = halftone_core::PatternField::for_ink(48, 48, &ink, Pattern::Circle);
        for dot in enumerate_dots(&image, &ink, &CancelToken::new()).unwrap() {
            let t = field.transform();
            let (_, uv) = t.local(t.to_grid(dot.center()));
            assert!(uv.length() < 1e-9, "dot {dot:?} is off the field lattice");
        }
    }

    #[test]
    fn cancelled_enumeration_fails() {
        let token = CancelToken::new();
        token.cancel();
        let image = gray(16, 16, 0);
        assert!(matches!(
            enumerate_dots(&image, &key_ink(4.0, 0.0), &token),
            Err(HalftoneError::Cancelled)
        ));
    }
}
