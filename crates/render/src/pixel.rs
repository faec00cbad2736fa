//! Pure-computation pixel buffer conversion for separation plates.
//!
//! Always available (no feature gate) so callers that bring their own
//! encoder can still preview individual plates.

use halftone_core::{Field, Srgb};

/// Renders a coverage plane as opaque ink on white, one RGBA8 pixel per value.
///
/// Each pixel is `white * (1 - c + c * ink)`, the same multiply the
/// compositor applies over paper. The buffer length is `width * height * 4`.
pub fn plate_to_rgba(coverage: &Field, ink: Srgb) -> Vec<u8> {
    let ink = [ink.r, ink.g, ink.b];
    coverage
        .data()
        .iter()
        .flat_map(|&c| {
            let channel = |i: usize| ((1.0 - c + c * ink[i]).clamp(0.0, 1.0) * 255.0).round() as u8;
            [channel(0), channel(1), channel(2), 255u8]
        })
        .collect()
}
