//! The halftone pattern field: per-pixel ink coverage for one screen.
//!
//! For a pixel position the field rotates into grid space, finds the
//! containing cell, and compares a pattern-specific distance of the
//! cell-local position against a radius derived from the ink value. The
//! distance formulas are closed forms tuned for visual parity between
//! screens and must stay exactly as written.
//!
//! The gooey pattern is different: it sums inverse-square influence from a
//! 7x7 neighborhood of cells (each with its own ink-derived radius) and
//! thresholds the sum, so neighboring dots merge.

use std::f64::consts::SQRT_2;

use glam::DVec2;

use crate::coverage::{Coverage, InkSampler};
use crate::grid::GridTransform;
use crate::settings::{Ink, Pattern};

/// Upper bound on the antialiasing half-width, in cell-local units.
const MAX_EDGE_WIDTH: f64 = 0.5;
/// Neighborhood radius (in cells) of the metaball convolution.
const METABALL_REACH: i64 = 3;
/// Influence reaches zero at this many cell sizes.
const METABALL_CUTOFF: f64 = 2.9;
/// Minimum distance used for metaball influence, in pixels.
const METABALL_MIN_DIST: f64 = 0.001;

/// Coverage evaluator for one ink screen over an image of fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternField {
    transform: GridTransform,
    pattern: Pattern,
    size: f64,
}

impl PatternField {
    /// `frequency` is cells across the image width, `angle` is in degrees,
    /// `size` is a percentage of the cell-filling dot.
    pub fn new(width: usize, height: usize, frequency: f64, angle: f64, size: f64, pattern: Pattern) -> Self {
        let cell_size = width as f64 / frequency;
        Self {
            transform: GridTransform::new(width as f64, height as f64, cell_size, angle),
            pattern,
            size,
        }
    }

    /// The field for a resolved ink channel.
    pub fn for_ink(width: usize, height: usize, ink: &Ink, pattern: Pattern) -> Self {
        Self::new(width, height, ink.frequency, ink.angle, ink.size, pattern)
    }

    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Ink coverage in [0, 1] at image-space position `p`.
    ///
    /// `value` is the ink intensity at `p`. `sampler` is only consulted by
    /// the gooey pattern, which reads the ink at neighboring cell centers.
    pub fn coverage<S: InkSampler + ?Sized>(&self, p: DVec2, value: f64, sampler: &S) -> f64 {
        match self.pattern {
            Pattern::Gooey => self.metaball_coverage(p, sampler),
            pattern => self.dot_coverage(pattern, p, value),
        }
    }

    fn dot_coverage(&self, pattern: Pattern, p: DVec2, value: f64) -> f64 {
        if !(value > 0.0) {
            return 0.0;
        }
        let value = value.min(1.0);
        let (_, uv) = self.transform.local(self.transform.to_grid(p));
        let radius = dot_radius(pattern, value, self.size);
        let d = distance(pattern, uv);

        // One output pixel along image x and y, in cell-local units. The
        // derivative is taken inside the current cell so cell seams do not
        // blur the edge.
        let cell = self.transform.cell_size();
        let step_x = self.transform.rotate_to_grid(DVec2::X) / cell;
        let step_y = self.transform.rotate_to_grid(DVec2::Y) / cell;
        let width = (distance(pattern, uv + step_x) - d).abs() + (distance(pattern, uv + step_y) - d).abs();

        1.0 - edge_step(radius, d, width.min(MAX_EDGE_WIDTH))
    }

    fn metaball_coverage<S: InkSampler + ?Sized>(&self, p: DVec2, sampler: &S) -> f64 {
        let t = &self.transform;
        let g = t.to_grid(p);
        let (i, j) = t.cell_index(g);
        let cell = t.cell_size();

        let mut sum = 0.0;
        let mut gradient = DVec2::ZERO;
        for dj in -METABALL_REACH..=METABALL_REACH {
            for di in -METABALL_REACH..=METABALL_REACH {
                let neighbor = t.cell(i + di, j + dj);
                let value = sampler.ink_at(neighbor.image_center).clamp(0.0, 1.0);
                if value <= 0.0 {
                    continue;
                }
                let radius = value.sqrt() * 0.5 * cell * (self.size / 100.0);
                let offset = g - neighbor.grid_center;
                let dist = offset.length().max(METABALL_MIN_DIST);
                let (influence, slope) = metaball_term(dist, radius, cell);
                sum += influence;
                gradient += offset / dist * slope;
            }
        }

        // Grid space is a pure rotation of image space, so rotating the
        // gradient back gives per-pixel derivatives along image axes.
        let g_img = t.rotate_to_image(gradient);
        let width = ((g_img.x.abs() + g_img.y.abs()) * 0.5).min(MAX_EDGE_WIDTH);
        edge_step(1.0, sum, width)
    }
}

/// Squared, windowed metaball influence of one dot at `dist` pixels.
///
/// `radius` is the dot radius in pixels. The window forces the influence to
/// exactly zero from `2.9 * cell_size` outward.
pub fn metaball_influence(dist: f64, radius: f64, cell_size: f64) -> f64 {
    metaball_term(dist.max(METABALL_MIN_DIST), radius, cell_size).0
}

/// Influence and its derivative with respect to `dist`.
fn metaball_term(dist: f64, radius: f64, cell_size: f64) -> (f64, f64) {
    let max_dist = cell_size * METABALL_CUTOFF;
    let window = smoothstep(max_dist, max_dist * 0.5, dist);
    if window <= 0.0 {
        return (0.0, 0.0);
    }
    let window_slope = smoothstep_slope(max_dist, max_dist * 0.5, dist);
    let k = radius * 1.5;
    let base = k / dist * window;
    let base_slope = -k / (dist * dist) * window + k / dist * window_slope;
    (base * base, 2.0 * base * base_slope)
}

/// Dot radius in cell-local units for ink `value` and `size` percent.
///
/// Area patterns grow with `sqrt(value)` so the inked area tracks the tone;
/// stripe, ring, wave and heart patterns measure a width and grow linearly.
pub fn dot_radius(pattern: Pattern, value: f64, size: f64) -> f64 {
    let scale = size / 100.0;
    match pattern {
        Pattern::Line => value * 0.45 * scale,
        Pattern::Ring => value * 0.2 * scale,
        Pattern::Wave | Pattern::Zigzag => value * 0.35 * scale,
        Pattern::Heart => value * 0.8 * scale,
        _ => value.sqrt() * 0.5 * scale,
    }
}

/// Pattern distance of a cell-local position `uv`.
///
/// Gooey has no per-cell distance and evaluates as a circle here.
pub fn distance(pattern: Pattern, uv: DVec2) -> f64 {
    match pattern {
        Pattern::Circle | Pattern::Gooey => uv.length(),
        Pattern::Square => uv.x.abs().max(uv.y.abs()),
        Pattern::Diamond => (uv.x.abs() + uv.y.abs()) * 0.707,
        Pattern::Ellipse => DVec2::new(uv.x, uv.y * 1.6).length(),
        Pattern::Line => uv.y.abs(),
        Pattern::Cross => uv.x.abs().min(uv.y.abs()),
        Pattern::Star => {
            let a = uv.y.atan2(uv.x);
            uv.length() * (1.0 + 0.3 * (a * 5.0).cos())
        }
        Pattern::Triangle => triangle_distance(uv),
        Pattern::Hex => {
            let p = uv.abs();
            (p.x * 0.866 + p.y * 0.5).max(p.y)
        }
        Pattern::Ring => (uv.length() - 0.3).abs(),
        Pattern::Wave => (uv.y - (uv.x * 6.28).sin() * 0.15).abs(),
        Pattern::DotGrid => {
            let sub = fract(uv * 2.0 + 0.5) - 0.5;
            sub.length() * 2.0
        }
        Pattern::Zigzag => {
            let wave = (fract_f(uv.x + 0.25) - 0.5).abs() - 0.25;
            (uv.y - wave * 2.0 * 0.25 * 2.0).abs()
        }
        Pattern::Heart => heart_distance(uv),
        Pattern::RoundedBox => {
            let p = uv.abs();
            (p.x.powi(4) + p.y.powi(4)).powf(0.25)
        }
    }
}

/// Radial distance blended with a mirrored equilateral-triangle SDF.
fn triangle_distance(uv: DVec2) -> f64 {
    let k = 3.0_f64.sqrt();
    let mut p = DVec2::new(uv.x.abs() - 0.5, uv.y + 0.5 / k);
    if p.x + k * p.y > 0.0 {
        p = DVec2::new(p.x - k * p.y, -k * p.x - p.y) / 2.0;
    }
    p.x -= p.x.clamp(-1.0, 0.0);
    let sdf = -p.length() * sign(p.y);
    uv.length() + sdf * 0.3
}

/// Heart SDF, scaled to the cell and shifted so the heart's interior sits near zero.
fn heart_distance(uv: DVec2) -> f64 {
    let mut p = DVec2::new(uv.x, -(uv.y + 0.1)) * 1.8;
    p.x = p.x.abs();
    let d = if p.y + p.x > 1.0 {
        (p - DVec2::new(0.25, 0.75)).length() - SQRT_2 / 4.0
    } else {
        let a = p - DVec2::new(0.0, 1.0);
        let b = p - DVec2::splat(0.5 * (p.x + p.y).max(0.0));
        a.dot(a).min(b.dot(b)).sqrt() * sign(p.x - p.y)
    };
    d + 0.5
}

/// 1 below `threshold`, 0 above, with a smooth band of half-width `width`.
///
/// Returns `smoothstep(threshold - width, threshold + width, value)`, the
/// fraction of the band `value` has crossed. A zero width is a hard step.
fn edge_step(threshold: f64, value: f64, width: f64) -> f64 {
    if width <= f64::EPSILON {
        return if value > threshold { 1.0 } else { 0.0 };
    }
    smoothstep(threshold - width, threshold + width, value)
}

/// Hermite smoothstep. Works with `edge0 > edge1` (a falling step).
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn smoothstep_slope(edge0: f64, edge1: f64, x: f64) -> f64 {
    let t = (x - edge0) / (edge1 - edge0);
    if t <= 0.0 || t >= 1.0 {
        0.0
    } else {
        6.0 * t * (1.0 - t) / (edge1 - edge0)
    }
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn fract_f(v: f64) -> f64 {
    v - v.floor()
}

fn fract(v: DVec2) -> DVec2 {
    v - v.floor()
}

/// A pattern field bound to the ink sampler it screens.
pub struct HalftoneField<S> {
    field: PatternField,
    sampler: S,
}

impl<S: InkSampler> HalftoneField<S> {
    pub fn new(field: PatternField, sampler: S) -> Self {
        Self { field, sampler }
    }

    pub fn field(&self) -> &PatternField {
        &self.field
    }
}

impl<S: InkSampler> Coverage for HalftoneField<S> {
    fn coverage_at(&self, p: DVec2) -> f64 {
        let value = self.sampler.ink_at(p);
        self.field.coverage(p, value, &self.sampler)
    }
}
