//! sRGB color type, hex parsing, and the fixed ink and paper colors.
//!
//! Colors are stored as `f64` components in [0, 1]. Hex strings are the
//! interchange format for settings files and SVG output.

use crate::error::HalftoneError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// sRGB color with components in [0, 1].
///
/// Serializes as a hex string `"#rrggbb"`. Deserialization is lenient: a
/// string that does not parse becomes black rather than failing the whole
/// settings document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Process cyan.
pub const CYAN_INK: Srgb = Srgb::from_u8(0x00, 0xae, 0xef);
/// Process magenta.
pub const MAGENTA_INK: Srgb = Srgb::from_u8(0xec, 0x00, 0x8c);
/// Process yellow.
pub const YELLOW_INK: Srgb = Srgb::from_u8(0xff, 0xf2, 0x00);
/// Key (rich black).
pub const KEY_INK: Srgb = Srgb::from_u8(0x23, 0x1f, 0x20);
/// Cream paper used for opaque backgrounds.
pub const PAPER: Srgb = Srgb::from_u8(0xf4, 0xf1, 0xea);

impl Srgb {
    pub const BLACK: Srgb = Srgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Srgb = Srgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Builds a color from 8-bit components.
    pub const fn from_u8(r: u8, g: u8, b: u8) -> Srgb {
        Srgb {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Parses a hex color string like "#ff00aa" or "ff00aa" (case insensitive).
    ///
    /// Returns `HalftoneError::InvalidColor` if the input is not a valid 6-digit hex color.
    pub fn from_hex(hex: &str) -> Result<Srgb, HalftoneError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(HalftoneError::InvalidColor(format!(
                "expected 6 hex digits, got '{hex}'"
            )));
        }
        let component = |range: std::ops::Range<usize>, name: &str| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| HalftoneError::InvalidColor(format!("invalid {name} component: {e}")))
        };
        Ok(Srgb::from_u8(
            component(0..2, "red")?,
            component(2..4, "green")?,
            component(4..6, "blue")?,
        ))
    }

    /// Parses a hex color, falling back to black when the input is unusable.
    pub fn parse_or_black(hex: &str) -> Srgb {
        Srgb::from_hex(hex).unwrap_or_else(|e| {
            log::warn!("{e}; using black");
            Srgb::BLACK
        })
    }

    /// Converts the color to a hex string like `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Quantizes the color to 8-bit components with rounding.
    pub fn to_u8(self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

impl Serialize for Srgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Srgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Srgb::parse_or_black(&s))
    }
}
