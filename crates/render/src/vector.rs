//! SVG export of the grid sampler's dots.
//!
//! Dot placement comes from [`enumerate_dots`], the same routine the grid
//! sampler draws from, so the vector output matches the sampled raster dot
//! for dot. Only process modes (cmyk, mono) have a vector channel mapping;
//! duotone and tritone export an empty but well-formed document.

use std::f64::consts::PI;
use std::path::Path;

use halftone_core::{ColorMode, Dot, HalftoneError, Ink, Pattern, Raster, Settings, PAPER};
use svg::node::element::{Circle, Ellipse, Group, Polygon, Rectangle};
use svg::Document;

use crate::cancel::CancelToken;
use crate::sampler::enumerate_dots;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
/// Opacity of each ink group.
pub const GROUP_OPACITY: f64 = 0.85;

/// Builds the SVG document for `image` under `settings`.
pub fn export_svg(image: &Raster, settings: &Settings, cancel: &CancelToken) -> Result<String, HalftoneError> {
    let (w, h) = (image.width(), image.height());
    let mut document = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if !settings.transparent_bg {
        document = document.add(
            Rectangle::new()
                .set("width", w)
                .set("height", h)
                .set("fill", PAPER.to_hex()),
        );
    }

    for ink in vector_inks(settings) {
        cancel.check()?;
        let dots = enumerate_dots(image, &ink, cancel)?;
        log::debug!("svg {}: {} dots", ink.label, dots.len());
        let group = dots.iter().fold(
            Group::new()
                .set("fill", ink.color.to_hex())
                .set("opacity", GROUP_OPACITY),
            |group, dot| add_shape(group, dot, settings.pattern, ink.angle),
        );
        document = document.add(group);
    }

    Ok(format!("{XML_DECLARATION}\n{document}\n"))
}

/// Writes a finished SVG document to `path`.
pub fn write_svg(document: &str, path: &Path) -> Result<(), HalftoneError> {
    std::fs::write(path, document).map_err(|e| HalftoneError::Io(e.to_string()))
}

/// Channels with a vector mapping. Tone modes have none.
fn vector_inks(settings: &Settings) -> Vec<Ink> {
    match settings.color_mode {
        ColorMode::Cmyk | ColorMode::Mono => settings.inks(),
        ColorMode::Duotone | ColorMode::Tritone => Vec::new(),
    }
}

fn fmt1(v: f64) -> String {
    format!("{v:.1}")
}

fn circle(cx: f64, cy: f64, r: f64) -> Circle {
    Circle::new()
        .set("cx", fmt1(cx))
        .set("cy", fmt1(cy))
        .set("r", fmt1(r))
}

fn square(dot: &Dot) -> Rectangle {
    let r = dot.radius;
    Rectangle::new()
        .set("x", fmt1(dot.x - r))
        .set("y", fmt1(dot.y - r))
        .set("width", fmt1(r * 2.0))
        .set("height", fmt1(r * 2.0))
}

fn add_shape(group: Group, dot: &Dot, pattern: Pattern, angle: f64) -> Group {
    let (x, y, r) = (dot.x, dot.y, dot.radius);
    match pattern {
        Pattern::Square => group.add(square(dot)),
        Pattern::Diamond => group.add(square(dot).set("transform", format!("rotate(45 {} {})", fmt1(x), fmt1(y)))),
        Pattern::Ellipse => group.add(
            Ellipse::new()
                .set("cx", fmt1(x))
                .set("cy", fmt1(y))
                .set("rx", fmt1(r))
                .set("ry", fmt1(r * 0.6))
                .set("transform", format!("rotate({angle} {} {})", fmt1(x), fmt1(y))),
        ),
        Pattern::Hex => {
            let points = (0..6)
                .map(|i| {
                    let a = i as f64 * PI / 3.0;
                    format!("{},{}", fmt1(x + r * a.cos()), fmt1(y + r * a.sin()))
                })
                .collect::<Vec<_>>()
                .join(" ");
            group.add(Polygon::new().set("points", points))
        }
        Pattern::DotGrid => {
            let s = r * 0.4;
            [(-s, -s), (s, -s), (-s, s), (s, s)]
                .into_iter()
                .fold(group, |g, (dx, dy)| g.add(circle(x + dx, y + dy, s)))
        }
        _ => group.add(circle(x, y, r)),
    }
}
