//! Rotated screen grid shared by every driver.
//!
//! Image space is top-down pixels with pixel `(x, y)` sampled at its center
//! `(x + 0.5, y + 0.5)`. Grid space is image space rotated by `-angle` about
//! the image center; screen cells are axis-aligned squares of `cell_size`
//! in grid space. The dense pattern field and the sparse grid sampler both
//! go through [`GridTransform`], so their dot lattices coincide.

use glam::DVec2;

/// Maps positions between image space and a rotated screen grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    center: DVec2,
    cell_size: f64,
    cos: f64,
    sin: f64,
}

/// A screen cell: integer lattice coordinates plus its center in both spaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub index: (i64, i64),
    pub grid_center: DVec2,
    pub image_center: DVec2,
}

impl GridTransform {
    /// Builds the transform for an image of `width x height` pixels.
    pub fn new(width: f64, height: f64, cell_size: f64, angle_degrees: f64) -> Self {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        Self {
            center: DVec2::new(width * 0.5, height * 0.5),
            cell_size,
            cos,
            sin,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Rotates an image-space offset into grid orientation (rotation by `-angle`).
    pub fn rotate_to_grid(&self, v: DVec2) -> DVec2 {
        DVec2::new(v.x * self.cos + v.y * self.sin, -v.x * self.sin + v.y * self.cos)
    }

    /// Rotates a grid-space offset back into image orientation (rotation by `+angle`).
    pub fn rotate_to_image(&self, v: DVec2) -> DVec2 {
        DVec2::new(v.x * self.cos - v.y * self.sin, v.x * self.sin + v.y * self.cos)
    }

    /// Image-space position to grid space.
    pub fn to_grid(&self, p: DVec2) -> DVec2 {
        self.rotate_to_grid(p - self.center) + self.center
    }

    /// Grid-space position to image space.
    pub fn to_image(&self, g: DVec2) -> DVec2 {
        self.rotate_to_image(g - self.center) + self.center
    }

    /// Lattice index of the cell containing grid-space point `g`.
    pub fn cell_index(&self, g: DVec2) -> (i64, i64) {
        let c = (g / self.cell_size).floor();
        (c.x as i64, c.y as i64)
    }

    /// The cell with lattice index `(i, j)`.
    pub fn cell(&self, i: i64, j: i64) -> Cell {
        let grid_center = DVec2::new(i as f64 + 0.5, j as f64 + 0.5) * self.cell_size;
        Cell {
            index: (i, j),
            grid_center,
            image_center: self.to_image(grid_center),
        }
    }

    /// Grid-space position to cell-local coordinates, roughly in [-0.5, 0.5]^2,
    /// together with the containing cell index.
    pub fn local(&self, g: DVec2) -> ((i64, i64), DVec2) {
        let index = self.cell_index(g);
        let center = self.cell(index.0, index.1).grid_center;
        (index, (g - center) / self.cell_size)
    }

    /// Lattice index ranges (inclusive) covering the whole rotated image.
    ///
    /// The range spans the image diagonal around the center rather than the
    /// axis-aligned bounds, so rotated corners are never left without cells.
    pub fn lattice_bounds(&self) -> ((i64, i64), (i64, i64)) {
        let half_diagonal = self.center.length();
        let lo = (self.center - DVec2::splat(half_diagonal)) / self.cell_size;
        let hi = (self.center + DVec2::splat(half_diagonal)) / self.cell_size;
        (
            (lo.x.floor() as i64, hi.x.ceil() as i64),
            (lo.y.floor() as i64, hi.y.ceil() as i64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn zero_angle_is_identity() {
        let t = GridTransform::new(100.0, 50.0, 10.0, 0.0);
        let p = DVec2::new(13.5, 42.5);
        assert!(close(t.to_grid(p), p));
        assert!(close(t.to_image(p), p));
    }

    #[test]
    fn to_image_inverts_to_grid() {
        let t = GridTransform::new(320.0, 200.0, 7.0, 37.0);
        for p in [
            DVec2::new(0.0, 0.0),
            DVec2::new(319.5, 0.5),
            DVec2::new(160.0, 100.0),
        ] {
            assert!(close(t.to_image(t.to_grid(p)), p));
        }
    }

    #[test]
    fn center_is_fixed_point() {
        let t = GridTransform::new(64.0, 48.0, 8.0, 75.0);
        assert!(close(t.to_grid(t.center()), t.center()));
    }

    #[test]
    fn rotation_direction_matches_screen_convention() {
        // Grid x-axis points along +angle in image space.
        let t = GridTransform::new(0.0, 0.0, 1.0, 90.0);
        assert!(close(t.rotate_to_image(DVec2::X), DVec2::Y));
        assert!(close(t.rotate_to_grid(DVec2::Y), DVec2::X));
    }

    #[test]
    fn local_coordinates_are_centered_in_cell() {
        let t = GridTransform::new(40.0, 40.0, 10.0, 0.0);
        let (index, uv) = t.local(DVec2::new(12.5, 27.5));
        assert_eq!(index, (1, 2));
        assert!(close(uv, DVec2::new(-0.25, 0.25)));
    }

    #[test]
    fn cell_center_maps_back_into_its_own_cell() {
        let t = GridTransform::new(90.0, 60.0, 9.0, 22.0);
        let cell = t.cell(3, -1);
        let (index, uv) = t.local(t.to_grid(cell.image_center));
        assert_eq!(index, (3, -1));
        assert!(uv.length() < 1e-6);
    }

    #[test]
    fn lattice_covers_every_pixel_at_any_angle() {
        for angle in [0.0, 15.0, 45.0, 75.0, 133.0] {
            let t = GridTransform::new(30.0, 20.0, 4.0, angle);
            let ((i0, i1), (j0, j1)) = t.lattice_bounds();
            for (x, y) in [(0.5, 0.5), (29.5, 0.5), (0.5, 19.5), (29.5, 19.5)] {
                let (i, j) = t.cell_index(t.to_grid(DVec2::new(x, y)));
                assert!(
                    (i0..=i1).contains(&i) && (j0..=j1).contains(&j),
                    "corner ({x},{y}) at {angle} deg fell outside lattice"
                );
            }
        }
    }
}
