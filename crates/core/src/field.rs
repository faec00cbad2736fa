//! Per-channel ink coverage plane.
//!
//! A `Field` stores `width * height` coverage values in [0, 1] using
//! row-major layout, one value per output pixel. Both drivers (the dense
//! rasterizer and the sparse grid sampler) produce one `Field` per ink
//! channel, which the compositor then blends in canonical order.

use crate::error::HalftoneError;

/// A 2D coverage plane with values clamped to [0, 1].
#[derive(Debug, Clone)]
pub struct Field {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Field {
    /// Creates a zero-coverage plane of the given dimensions.
    ///
    /// Returns `HalftoneError::InvalidDimensions` if either dimension is zero
    /// or if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Result<Self, HalftoneError> {
        let len = Self::checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0.0; len],
        })
    }

    /// Creates a plane from pre-computed values, validating the length.
    ///
    /// Values are clamped to [0, 1].
    pub fn from_data(width: usize, height: usize, mut data: Vec<f64>) -> Result<Self, HalftoneError> {
        let expected = Self::checked_len(width, height)?;
        if data.len() != expected {
            return Err(HalftoneError::DimensionMismatch {
                expected,
                got: data.len(),
            });
        }
        data.iter_mut().for_each(|v| *v = clamp_unit(*v));
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn checked_len(width: usize, height: usize) -> Result<usize, HalftoneError> {
        if width == 0 || height == 0 {
            return Err(HalftoneError::InvalidDimensions);
        }
        width
            .checked_mul(height)
            .ok_or(HalftoneError::InvalidDimensions)
    }

    /// Plane width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read-only access to the underlying row-major data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Coverage at `(x, y)`, or `None` outside the plane.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Sets coverage at `(x, y)`, clamped to [0, 1]. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = clamp_unit(value);
        }
    }

    /// Unions `alpha` into the coverage at `(x, y)` the way an opaque fill
    /// of one color accumulates: `c = 1 - (1 - c)(1 - alpha)`.
    pub fn accumulate(&mut self, x: usize, y: usize, alpha: f64) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            let a = clamp_unit(alpha);
            self.data[idx] = 1.0 - (1.0 - self.data[idx]) * (1.0 - a);
        }
    }

    /// Largest coverage value in the plane.
    pub fn max_value(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// Iterates over all pixels yielding `(x, y, coverage)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data.iter().enumerate().map(|(i, &v)| {
            let x = i % self.width;
            let y = i / self.width;
            (x, y, v)
        })
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_empty_plane() {
        let field = Field::new(4, 3).unwrap();
        assert_eq!(field.width(), 4);
        assert_eq!(field.height(), 3);
        assert_eq!(field.data().len(), 12);
        assert!(field.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn new_with_zero_dimension_returns_error() {
        assert!(matches!(
            Field::new(0, 5),
            Err(HalftoneError::InvalidDimensions)
        ));
        assert!(Field::new(5, 0).is_err());
    }

    #[test]
    fn new_with_overflowing_dimensions_returns_error() {
        assert!(Field::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn from_data_validates_length_and_clamps() {
        assert!(Field::from_data(2, 2, vec![0.0; 3]).is_err());
        let f = Field::from_data(2, 1, vec![-1.0, 2.0]).unwrap();
        assert_eq!(f.data(), &[0.0, 1.0]);
    }

    #[test]
    fn set_clamps_and_get_reads_back() {
        let mut f = Field::new(3, 3).unwrap();
        f.set(1, 2, 0.4);
        f.set(0, 0, 7.0);
        assert_eq!(f.get(1, 2), Some(0.4));
        assert_eq!(f.get(0, 0), Some(1.0));
    }

    #[test]
    fn out_of_bounds_access_is_ignored() {
        let mut f = Field::new(2, 2).unwrap();
        f.set(5, 0, 1.0);
        f.accumulate(0, 9, 1.0);
        assert_eq!(f.get(5, 0), None);
        assert_eq!(f.max_value(), 0.0);
    }

    #[test]
    fn accumulate_unions_coverage() {
        let mut f = Field::new(1, 1).unwrap();
        f.accumulate(0, 0, 0.5);
        f.accumulate(0, 0, 0.5);
        assert!((f.get(0, 0).unwrap() - 0.75).abs() < 1e-12);
        f.accumulate(0, 0, 1.0);
        assert_eq!(f.get(0, 0), Some(1.0));
    }

    #[test]
    fn nan_is_stored_as_zero() {
        let mut f = Field::new(1, 1).unwrap();
        f.set(0, 0, f64::NAN);
        assert_eq!(f.get(0, 0), Some(0.0));
    }

    #[test]
    fn iter_yields_row_major_coordinates() {
        let mut f = Field::new(2, 2).unwrap();
        f.set(1, 0, 0.25);
        let collected: Vec<_> = f.iter().collect();
        assert_eq!(collected[1], (1, 0, 0.25));
        assert_eq!(collected[2], (0, 1, 0.0));
    }
}
