//! Explicit dot shapes for the grid sampler.
//!
//! Each visible lattice center becomes one closed shape in pixel units,
//! evaluated as a signed distance (negative inside) and antialiased over
//! one pixel. Polygonal shapes keep a unit outline and scale it by the dot
//! radius, so the outline is built once per channel rather than per pixel.

use std::f64::consts::{FRAC_PI_4, PI, SQRT_2};

use glam::DVec2;

use crate::coverage::Coverage;
use crate::pattern::smoothstep;
use crate::settings::Pattern;

/// Line segments per cubic when flattening the heart outline.
const BEZIER_STEPS: usize = 16;
/// Stroke width of the zigzag polyline, in pixels.
const ZIGZAG_STROKE: f64 = 1.0;

/// One visible dot: its center in image space and radius in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dot {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Dot {
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// The explicit shape drawn for every dot of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DotShape {
    pattern: Pattern,
    cell_size: f64,
    cos: f64,
    sin: f64,
    outline: Vec<DVec2>,
}

impl DotShape {
    /// Gooey has no discrete equivalent and is drawn as a circle.
    pub fn new(pattern: Pattern, cell_size: f64, angle_degrees: f64) -> Self {
        let pattern = match pattern {
            Pattern::Gooey => Pattern::Circle,
            p => p,
        };
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        Self {
            pattern,
            cell_size,
            cos,
            sin,
            outline: unit_outline(pattern),
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    /// Signed distance in pixels from `p` to the shape of `dot`.
    pub fn sdf(&self, dot: &Dot, p: DVec2) -> f64 {
        let r = dot.radius;
        let q = p - dot.center();
        let cell = self.cell_size;
        match self.pattern {
            Pattern::Square => sdf_box(q, DVec2::splat(r)),
            Pattern::Diamond => {
                let (s, c) = FRAC_PI_4.sin_cos();
                let rotated = DVec2::new(q.x * c + q.y * s, -q.x * s + q.y * c);
                sdf_box(rotated, DVec2::splat(r))
            }
            Pattern::Ellipse => sdf_ellipse(self.to_shape_frame(q), r, r * 0.6),
            Pattern::Wave => sdf_ellipse(self.to_shape_frame(q), r, r * 0.3),
            Pattern::Line => sdf_box(q, DVec2::new(cell * 0.4, r * 0.3)),
            Pattern::Cross => {
                let vertical = sdf_box(q, DVec2::new(r * 0.2, r));
                let horizontal = sdf_box(q, DVec2::new(r, r * 0.2));
                vertical.min(horizontal)
            }
            Pattern::Star | Pattern::Triangle | Pattern::Hex | Pattern::Heart => {
                if r <= 0.0 {
                    return q.length();
                }
                sdf_polygon(&self.outline, q / r) * r
            }
            Pattern::Ring => {
                let len = q.length();
                (len - r).max(r * 0.5 - len)
            }
            Pattern::DotGrid => {
                let s = r * 0.4;
                [(-s, -s), (s, -s), (-s, s), (s, s)]
                    .into_iter()
                    .map(|(dx, dy)| (q - DVec2::new(dx, dy)).length() - s)
                    .fold(f64::INFINITY, f64::min)
            }
            Pattern::Zigzag => {
                let pts = [
                    DVec2::new(-cell / 2.0, 0.0),
                    DVec2::new(-cell / 4.0, -r),
                    DVec2::new(cell / 4.0, r),
                    DVec2::new(cell / 2.0, 0.0),
                ];
                let dist = pts
                    .windows(2)
                    .map(|w| segment_distance(q, w[0], w[1]))
                    .fold(f64::INFINITY, f64::min);
                dist - ZIGZAG_STROKE * 0.5
            }
            Pattern::RoundedBox => sdf_rounded_box(q, DVec2::splat(r), r * 0.5),
            Pattern::Circle | Pattern::Gooey => q.length() - r,
        }
    }

    /// Antialiased coverage of `dot` at pixel-center `p`.
    pub fn coverage(&self, dot: &Dot, p: DVec2) -> f64 {
        1.0 - smoothstep(-0.5, 0.5, self.sdf(dot, p))
    }

    /// Half-size of a square around the dot center outside which coverage is zero.
    pub fn extent(&self, dot: &Dot) -> f64 {
        let r = dot.radius;
        let reach = match self.pattern {
            Pattern::Line => DVec2::new(self.cell_size * 0.4, r * 0.3).length(),
            Pattern::Zigzag => DVec2::new(self.cell_size * 0.5, r).length() + ZIGZAG_STROKE,
            Pattern::Square | Pattern::Diamond | Pattern::RoundedBox | Pattern::Cross => r * SQRT_2,
            Pattern::Heart => r * 1.6,
            _ => r,
        };
        reach + 1.0
    }

    /// Binds this shape to one dot as a point-coverage source.
    pub fn place(&self, dot: Dot) -> PlacedDot<'_> {
        PlacedDot { shape: self, dot }
    }

    fn to_shape_frame(&self, q: DVec2) -> DVec2 {
        DVec2::new(q.x * self.cos + q.y * self.sin, -q.x * self.sin + q.y * self.cos)
    }
}

/// A dot bound to its channel's shape.
#[derive(Debug, Clone, Copy)]
pub struct PlacedDot<'a> {
    shape: &'a DotShape,
    dot: Dot,
}

impl PlacedDot<'_> {
    pub fn dot(&self) -> Dot {
        self.dot
    }
}

impl Coverage for PlacedDot<'_> {
    fn coverage_at(&self, p: DVec2) -> f64 {
        self.shape.coverage(&self.dot, p)
    }
}

/// Outline at radius 1 in top-down image orientation, empty for non-polygons.
fn unit_outline(pattern: Pattern) -> Vec<DVec2> {
    match pattern {
        Pattern::Star => (0..10)
            .map(|k| {
                let a = PI * 1.5 + k as f64 * PI / 5.0;
                let r = if k % 2 == 0 { 1.0 } else { 0.5 };
                DVec2::new(a.cos(), a.sin()) * r
            })
            .collect(),
        Pattern::Triangle => vec![
            DVec2::new(0.0, -1.0),
            DVec2::new(0.866, 0.5),
            DVec2::new(-0.866, 0.5),
        ],
        Pattern::Hex => (0..6)
            .map(|k| {
                let a = k as f64 * PI / 3.0;
                DVec2::new(a.cos(), a.sin())
            })
            .collect(),
        Pattern::Heart => {
            let tip = DVec2::new(0.0, 0.5);
            let notch = DVec2::new(0.0, -0.5);
            let mut pts = Vec::with_capacity(BEZIER_STEPS * 2);
            flatten_cubic(&mut pts, [tip, DVec2::new(1.0, -0.5), DVec2::new(1.0, -1.5), notch]);
            flatten_cubic(&mut pts, [notch, DVec2::new(-1.0, -1.5), DVec2::new(-1.0, -0.5), tip]);
            pts
        }
        _ => Vec::new(),
    }
}

/// Appends the cubic's points, excluding its end point (the next curve starts there).
fn flatten_cubic(out: &mut Vec<DVec2>, [p0, p1, p2, p3]: [DVec2; 4]) {
    for i in 0..BEZIER_STEPS {
        let t = i as f64 / BEZIER_STEPS as f64;
        let u = 1.0 - t;
        out.push(p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t));
    }
}

fn sdf_box(q: DVec2, half: DVec2) -> f64 {
    let d = q.abs() - half;
    d.max(DVec2::ZERO).length() + d.x.max(d.y).min(0.0)
}

fn sdf_rounded_box(q: DVec2, half: DVec2, corner: f64) -> f64 {
    let corner = corner.min(half.x).min(half.y);
    sdf_box(q, half - DVec2::splat(corner)) - corner
}

/// Approximate ellipse distance: the normalized radial error scaled by the
/// local gradient. Accurate near the boundary, which is all the edge needs.
fn sdf_ellipse(q: DVec2, rx: f64, ry: f64) -> f64 {
    if rx <= 0.0 || ry <= 0.0 {
        return q.length();
    }
    let n = DVec2::new(q.x / rx, q.y / ry);
    let len = n.length();
    if len < 1e-12 {
        return -rx.min(ry);
    }
    let scale = (rx * rx * n.y * n.y + ry * ry * n.x * n.x).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

/// Signed distance to a simple polygon (either winding), negative inside.
fn sdf_polygon(verts: &[DVec2], p: DVec2) -> f64 {
    let Some(&first) = verts.first() else {
        return p.length();
    };
    let mut d = (p - first).length_squared();
    let mut s = 1.0;
    let mut j = verts.len() - 1;
    for i in 0..verts.len() {
        let e = verts[j] - verts[i];
        let w = p - verts[i];
        let b = w - e * (w.dot(e) / e.length_squared()).clamp(0.0, 1.0);
        d = d.min(b.length_squared());
        let c1 = p.y >= verts[i].y;
        let c2 = p.y < verts[j].y;
        let c3 = e.x * w.y > e.y * w.x;
        if (c1 && c2 && c3) || (!c1 && !c2 && !c3) {
            s = -s;
        }
        j = i;
    }
    s * d.sqrt()
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).length()
}
