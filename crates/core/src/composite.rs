//! Subtractive multiply compositing of ink coverage planes.
//!
//! Each ink is a layer of solid color whose alpha is the channel coverage,
//! blended with the W3C `multiply` mode under source-over alpha:
//!
//! ```text
//! a_o   = a_s + a_b (1 - a_s)
//! a_o C = a_s (1 - a_b) C_s + a_s a_b C_b C_s + (1 - a_s) a_b C_b
//! ```
//!
//! Over an opaque page this is `dst * (1 - c + c * ink)`. Rounding depends
//! on the sequence of applications, so callers apply inks in canonical order.

use crate::color::Srgb;
use crate::error::HalftoneError;
use crate::field::Field;
use crate::raster::Raster;

/// What the inks are printed onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Opaque(Srgb),
    Transparent,
}

/// Straight-alpha accumulator that inks are multiplied into, one channel at a time.
#[derive(Debug, Clone)]
pub struct Compositor {
    width: usize,
    height: usize,
    rgb: Vec<[f64; 3]>,
    alpha: Vec<f64>,
}

impl Compositor {
    pub fn new(width: usize, height: usize, background: Background) -> Result<Self, HalftoneError> {
        if width == 0 || height == 0 {
            return Err(HalftoneError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .ok_or(HalftoneError::InvalidDimensions)?;
        let (color, alpha) = match background {
            Background::Opaque(c) => (c, 1.0),
            Background::Transparent => (Srgb::WHITE, 0.0),
        };
        Ok(Self {
            width,
            height,
            rgb: vec![[color.r, color.g, color.b]; len],
            alpha: vec![alpha; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Multiplies one ink layer with per-pixel coverage into the accumulator.
    pub fn apply(&mut self, coverage: &Field, ink: Srgb) -> Result<(), HalftoneError> {
        if coverage.width() != self.width || coverage.height() != self.height {
            return Err(HalftoneError::DimensionMismatch {
                expected: self.width * self.height,
                got: coverage.width() * coverage.height(),
            });
        }
        let ink = [ink.r, ink.g, ink.b];
        for ((rgb, alpha), &c) in self
            .rgb
            .iter_mut()
            .zip(self.alpha.iter_mut())
            .zip(coverage.data())
        {
            if c <= 0.0 {
                continue;
            }
            let (blended, a) = multiply_over(*rgb, *alpha, ink, c);
            *rgb = blended;
            *alpha = a;
        }
        Ok(())
    }

    /// Quantizes the accumulator into an RGBA8 raster.
    pub fn finish(self) -> Result<Raster, HalftoneError> {
        let mut pixels = Vec::with_capacity(self.rgb.len() * 4);
        for (rgb, &a) in self.rgb.iter().zip(&self.alpha) {
            pixels.extend_from_slice(&[to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]), to_byte(a)]);
        }
        Raster::from_rgba(self.width, self.height, pixels)
    }
}

/// One multiply-over step for a single pixel. Returns straight color and alpha.
pub fn multiply_over(backdrop: [f64; 3], backdrop_alpha: f64, source: [f64; 3], source_alpha: f64) -> ([f64; 3], f64) {
    let a_s = source_alpha.clamp(0.0, 1.0);
    let a_b = backdrop_alpha.clamp(0.0, 1.0);
    let a_o = a_s + a_b * (1.0 - a_s);
    if a_o <= 0.0 {
        return (backdrop, 0.0);
    }
    let mut out = [0.0; 3];
    for i in 0..3 {
        let (cs, cb) = (source[i], backdrop[i]);
        let premultiplied = a_s * (1.0 - a_b) * cs + a_s * a_b * cb * cs + (1.0 - a_s) * a_b * cb;
        out[i] = (premultiplied / a_o).clamp(0.0, 1.0);
    }
    (out, a_o)
}

fn to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
