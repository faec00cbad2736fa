//! Color separation: source pixel to per-channel ink intensity.
//!
//! CMYK uses the naive under-color formula. Duotone and tritone are not
//! physical separations but fixed tone curves over Rec. 601 luminance; the
//! constants are what the screens were tuned against and must not drift.

use serde::{Deserialize, Serialize};

use crate::color::Srgb;
use crate::settings::ColorMode;

/// Key at or above this value is treated as pure black (no C/M/Y).
const PURE_BLACK_KEY: f64 = 0.9999;

/// A CMYK separation with every component in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

/// One of the four process channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    Cyan,
    Magenta,
    Yellow,
    Key,
}

impl Process {
    /// Canonical composite order.
    pub const ALL: [Process; 4] = [
        Process::Cyan,
        Process::Magenta,
        Process::Yellow,
        Process::Key,
    ];

    /// Position in the canonical order (cyan = 0 ... key = 3).
    pub fn index(self) -> usize {
        match self {
            Process::Cyan => 0,
            Process::Magenta => 1,
            Process::Yellow => 2,
            Process::Key => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Process::Cyan => "cyan",
            Process::Magenta => "magenta",
            Process::Yellow => "yellow",
            Process::Key => "key",
        }
    }
}

/// How a channel derives its ink intensity from a source color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Separation {
    /// One component of the CMYK separation.
    Process(Process),
    /// Tone `index` of a `total`-tone luminance split (2 = duotone, 3 = tritone).
    Tone { index: usize, total: usize },
}

impl Separation {
    /// Ink intensity in [0, 1] for the given source color.
    pub fn intensity(self, rgb: Srgb) -> f64 {
        match self {
            Separation::Process(p) => {
                let cmyk = rgb_to_cmyk(rgb);
                match p {
                    Process::Cyan => cmyk.c,
                    Process::Magenta => cmyk.m,
                    Process::Yellow => cmyk.y,
                    Process::Key => cmyk.k,
                }
            }
            Separation::Tone { index, total } => tone_intensity(luminance(rgb), index, total),
        }
    }
}

/// Separates an RGB color into CMYK.
///
/// `K = 1 - max(r, g, b)`; near-black collapses to `(0, 0, 0, 1)` so the
/// division by `1 - K` never blows up.
pub fn rgb_to_cmyk(rgb: Srgb) -> Cmyk {
    let r = rgb.r.clamp(0.0, 1.0);
    let g = rgb.g.clamp(0.0, 1.0);
    let b = rgb.b.clamp(0.0, 1.0);
    let k = 1.0 - r.max(g).max(b);
    if k >= PURE_BLACK_KEY {
        return Cmyk {
            c: 0.0,
            m: 0.0,
            y: 0.0,
            k: 1.0,
        };
    }
    let inv = 1.0 / (1.0 - k);
    Cmyk {
        c: ((1.0 - r - k) * inv).clamp(0.0, 1.0),
        m: ((1.0 - g - k) * inv).clamp(0.0, 1.0),
        y: ((1.0 - b - k) * inv).clamp(0.0, 1.0),
        k,
    }
}

/// Rec. 601 luma.
pub fn luminance(rgb: Srgb) -> f64 {
    0.299 * rgb.r + 0.587 * rgb.g + 0.114 * rgb.b
}

fn tone_intensity(lum: f64, index: usize, total: usize) -> f64 {
    let v = if total == 2 {
        if index == 0 {
            (1.0 - lum).max(0.0).powf(1.2) * 0.8
        } else {
            lum * 0.6
        }
    } else {
        match index {
            0 => ((0.4 - lum) * 2.5).max(0.0),
            1 => (1.0 - (lum - 0.5).abs() * 2.5).max(0.0),
            _ => ((lum - 0.6) * 2.5).max(0.0),
        }
    };
    v.clamp(0.0, 1.0)
}

/// Ink intensity of channel `channel` (of `total`) for `rgb` under `mode`.
///
/// For cmyk the channel index follows the canonical order; mono always
/// returns the key channel; duotone and tritone pick a tone by index.
pub fn separate(rgb: Srgb, mode: ColorMode, channel: usize, total: usize) -> f64 {
    let separation = match mode {
        ColorMode::Cmyk => Separation::Process(Process::ALL[channel.min(3)]),
        ColorMode::Mono => Separation::Process(Process::Key),
        ColorMode::Duotone | ColorMode::Tritone => Separation::Tone {
            index: channel,
            total,
        },
    };
    separation.intensity(rgb)
}
