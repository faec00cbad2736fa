//! Render settings snapshot and the per-pass ink plan derived from it.
//!
//! A [`Settings`] value is an immutable snapshot for one render call. Every
//! field has a default, so a partial JSON document deserializes cleanly.
//! [`Settings::inks`] resolves the snapshot into the ordered list of
//! [`Ink`]s that the drivers actually screen and composite.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::color::{Srgb, CYAN_INK, KEY_INK, MAGENTA_INK, YELLOW_INK};
use crate::error::HalftoneError;
use crate::separation::{Process, Separation};

/// Number of dot patterns the engine knows.
pub const PATTERN_COUNT: usize = 16;

/// Screen angles for duotone/tritone tones, by tone index.
pub const TONE_ANGLES: [f64; 3] = [15.0, 75.0, 45.0];

const DEFAULT_FREQUENCY: f64 = 45.0;
const DEFAULT_SIZE: f64 = 100.0;

/// Dot pattern. Discriminants are the stable numeric pattern ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Pattern {
    #[default]
    Circle = 0,
    Square = 1,
    Diamond = 2,
    Ellipse = 3,
    Line = 4,
    Cross = 5,
    Star = 6,
    Triangle = 7,
    Hex = 8,
    Ring = 9,
    Wave = 10,
    DotGrid = 11,
    Gooey = 12,
    Zigzag = 13,
    Heart = 14,
    RoundedBox = 15,
}

impl Pattern {
    /// All patterns in id order.
    pub const ALL: [Pattern; PATTERN_COUNT] = [
        Pattern::Circle,
        Pattern::Square,
        Pattern::Diamond,
        Pattern::Ellipse,
        Pattern::Line,
        Pattern::Cross,
        Pattern::Star,
        Pattern::Triangle,
        Pattern::Hex,
        Pattern::Ring,
        Pattern::Wave,
        Pattern::DotGrid,
        Pattern::Gooey,
        Pattern::Zigzag,
        Pattern::Heart,
        Pattern::RoundedBox,
    ];

    /// Numeric pattern id.
    pub fn id(self) -> usize {
        self as usize
    }

    /// Looks a pattern up by id; unknown ids fall back to circle.
    pub fn from_id(id: usize) -> Pattern {
        Pattern::ALL.get(id).copied().unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            Pattern::Circle => "circle",
            Pattern::Square => "square",
            Pattern::Diamond => "diamond",
            Pattern::Ellipse => "ellipse",
            Pattern::Line => "line",
            Pattern::Cross => "cross",
            Pattern::Star => "star",
            Pattern::Triangle => "triangle",
            Pattern::Hex => "hex",
            Pattern::Ring => "ring",
            Pattern::Wave => "wave",
            Pattern::DotGrid => "dot-grid",
            Pattern::Gooey => "gooey",
            Pattern::Zigzag => "zigzag",
            Pattern::Heart => "heart",
            Pattern::RoundedBox => "rounded-box",
        }
    }

    /// Looks a pattern up by name; unknown names fall back to circle.
    pub fn from_name(name: &str) -> Pattern {
        let name = name.trim();
        Pattern::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .unwrap_or_else(|| {
                log::debug!("unknown pattern '{name}', using circle");
                Pattern::Circle
            })
    }

    /// Names of all patterns in id order.
    pub fn names() -> Vec<&'static str> {
        Pattern::ALL.iter().map(|p| p.name()).collect()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Accepts a pattern name or a numeric id; unknown values become circle.
impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PatternVisitor)
    }
}

struct PatternVisitor;

impl Visitor<'_> for PatternVisitor {
    type Value = Pattern;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a pattern name or id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Pattern, E> {
        Ok(Pattern::from_name(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Pattern, E> {
        Ok(usize::try_from(v).map(Pattern::from_id).unwrap_or_default())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Pattern, E> {
        Ok(usize::try_from(v).map(Pattern::from_id).unwrap_or_default())
    }
}

/// How the source image is separated into ink channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Cmyk,
    Mono,
    Duotone,
    Tritone,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [
        ColorMode::Cmyk,
        ColorMode::Mono,
        ColorMode::Duotone,
        ColorMode::Tritone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Cmyk => "cmyk",
            ColorMode::Mono => "mono",
            ColorMode::Duotone => "duotone",
            ColorMode::Tritone => "tritone",
        }
    }

    /// Parses a mode name (case insensitive).
    pub fn from_name(name: &str) -> Result<ColorMode, HalftoneError> {
        ColorMode::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| HalftoneError::InvalidSettings(format!("unknown color mode '{name}'")))
    }

    /// Number of custom tones for duotone/tritone, `None` for process modes.
    pub fn tone_count(self) -> Option<usize> {
        match self {
            ColorMode::Duotone => Some(2),
            ColorMode::Tritone => Some(3),
            ColorMode::Cmyk | ColorMode::Mono => None,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Screen parameters for one ink channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub enabled: bool,
    /// Screen angle in degrees.
    pub angle: f64,
    /// Dot size in percent of the cell-filling size.
    pub size: f64,
    /// Cells across the image width.
    pub frequency: f64,
    pub color: Srgb,
}

impl Channel {
    pub fn new(angle: f64, color: Srgb) -> Self {
        Self {
            enabled: true,
            angle,
            size: DEFAULT_SIZE,
            frequency: DEFAULT_FREQUENCY,
            color,
        }
    }

    fn validate(&self, name: &str) -> Result<(), HalftoneError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(HalftoneError::InvalidSettings(format!(
                "{name}: frequency must be positive, got {}",
                self.frequency
            )));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(HalftoneError::InvalidSettings(format!(
                "{name}: size must be positive, got {}",
                self.size
            )));
        }
        if !self.angle.is_finite() {
            return Err(HalftoneError::InvalidSettings(format!(
                "{name}: angle must be finite"
            )));
        }
        Ok(())
    }
}

impl Default for Channel {
    fn default() -> Self {
        Channel::new(0.0, KEY_INK)
    }
}

/// The four channel records, keyed by process name, in canonical order.
///
/// Deserialization merges whatever keys are present over each channel's own
/// defaults, so `{"cyan": {"angle": 30}}` keeps cyan's color and screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChannelsPatch")]
pub struct Channels {
    pub cyan: Channel,
    pub magenta: Channel,
    pub yellow: Channel,
    pub key: Channel,
}

impl Default for Channels {
    fn default() -> Self {
        Self {
            cyan: Channel::new(15.0, CYAN_INK),
            magenta: Channel::new(75.0, MAGENTA_INK),
            yellow: Channel::new(0.0, YELLOW_INK),
            key: Channel::new(45.0, KEY_INK),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChannelPatch {
    enabled: Option<bool>,
    angle: Option<f64>,
    size: Option<f64>,
    frequency: Option<f64>,
    color: Option<Srgb>,
}

impl ChannelPatch {
    fn apply(self, base: Channel) -> Channel {
        Channel {
            enabled: self.enabled.unwrap_or(base.enabled),
            angle: self.angle.unwrap_or(base.angle),
            size: self.size.unwrap_or(base.size),
            frequency: self.frequency.unwrap_or(base.frequency),
            color: self.color.unwrap_or(base.color),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChannelsPatch {
    cyan: ChannelPatch,
    magenta: ChannelPatch,
    yellow: ChannelPatch,
    key: ChannelPatch,
}

impl ChannelsPatch {
    fn apply(self, base: Channels) -> Channels {
        Channels {
            cyan: self.cyan.apply(base.cyan),
            magenta: self.magenta.apply(base.magenta),
            yellow: self.yellow.apply(base.yellow),
            key: self.key.apply(base.key),
        }
    }
}

impl From<ChannelsPatch> for Channels {
    fn from(patch: ChannelsPatch) -> Self {
        patch.apply(Channels::default())
    }
}

impl Channels {
    pub fn get(&self, process: Process) -> &Channel {
        match process {
            Process::Cyan => &self.cyan,
            Process::Magenta => &self.magenta,
            Process::Yellow => &self.yellow,
            Process::Key => &self.key,
        }
    }

    pub fn get_mut(&mut self, process: Process) -> &mut Channel {
        match process {
            Process::Cyan => &mut self.cyan,
            Process::Magenta => &mut self.magenta,
            Process::Yellow => &mut self.yellow,
            Process::Key => &mut self.key,
        }
    }

    /// Channel record by position in canonical order (custom tones index this way).
    pub fn by_index(&self, index: usize) -> &Channel {
        self.get(Process::ALL[index.min(3)])
    }

    /// Iterates `(process, channel)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Process, &Channel)> + '_ {
        Process::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// Immutable settings snapshot for one render call.
///
/// On input, the global frequency and size seed every channel field the
/// document leaves out; explicit channel values still win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SettingsPatch")]
pub struct Settings {
    pub pattern: Pattern,
    pub color_mode: ColorMode,
    /// Last value written through [`Settings::set_global_frequency`].
    pub global_frequency: f64,
    /// Last value written through [`Settings::set_global_size`].
    pub global_size: f64,
    pub channels: Channels,
    pub custom_colors: Vec<Srgb>,
    pub transparent_bg: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pattern: Pattern::Circle,
            color_mode: ColorMode::Cmyk,
            global_frequency: DEFAULT_FREQUENCY,
            global_size: DEFAULT_SIZE,
            channels: Channels::default(),
            custom_colors: vec![
                Srgb::from_u8(0xc8, 0x5a, 0x54),
                Srgb::from_u8(0x3d, 0x36, 0x32),
                CYAN_INK,
            ],
            transparent_bg: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsPatch {
    pattern: Option<Pattern>,
    color_mode: Option<ColorMode>,
    global_frequency: Option<f64>,
    global_size: Option<f64>,
    channels: ChannelsPatch,
    custom_colors: Option<Vec<Srgb>>,
    transparent_bg: Option<bool>,
}

impl From<SettingsPatch> for Settings {
    fn from(patch: SettingsPatch) -> Self {
        let mut settings = Settings::default();
        if let Some(frequency) = patch.global_frequency {
            settings.set_global_frequency(frequency);
        }
        if let Some(size) = patch.global_size {
            settings.set_global_size(size);
        }
        settings.channels = patch.channels.apply(settings.channels);
        Settings {
            pattern: patch.pattern.unwrap_or(settings.pattern),
            color_mode: patch.color_mode.unwrap_or(settings.color_mode),
            custom_colors: patch.custom_colors.unwrap_or(settings.custom_colors),
            transparent_bg: patch.transparent_bg.unwrap_or(settings.transparent_bg),
            ..settings
        }
    }
}

/// One resolved ink channel: what to separate, how to screen it, what color to print.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ink {
    pub label: &'static str,
    pub separation: Separation,
    pub angle: f64,
    pub frequency: f64,
    pub size: f64,
    pub color: Srgb,
}

const TONE_LABELS: [&str; 3] = ["tone-0", "tone-1", "tone-2"];

impl Settings {
    /// Parses a settings snapshot from JSON; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Settings, HalftoneError> {
        serde_json::from_str(json).map_err(|e| HalftoneError::InvalidSettings(e.to_string()))
    }

    /// Writes `frequency` into the global control and every channel at once.
    pub fn set_global_frequency(&mut self, frequency: f64) {
        self.global_frequency = frequency;
        for p in Process::ALL {
            self.channels.get_mut(p).frequency = frequency;
        }
    }

    /// Writes `size` into the global control and every channel at once.
    pub fn set_global_size(&mut self, size: f64) {
        self.global_size = size;
        for p in Process::ALL {
            self.channels.get_mut(p).size = size;
        }
    }

    /// Rejects snapshots the engine cannot screen.
    pub fn validate(&self) -> Result<(), HalftoneError> {
        for (p, ch) in self.channels.iter() {
            ch.validate(p.name())?;
        }
        Ok(())
    }

    /// The enabled ink channels for this snapshot, in canonical composite order.
    ///
    /// cmyk yields up to four process inks, mono only key, duotone/tritone
    /// one ink per tone using the custom colors and fixed tone angles.
    pub fn inks(&self) -> Vec<Ink> {
        let process_ink = |p: Process| {
            let ch = self.channels.get(p);
            ch.enabled.then(|| Ink {
                label: p.name(),
                separation: Separation::Process(p),
                angle: normalize_angle(ch.angle),
                frequency: ch.frequency,
                size: ch.size,
                color: ch.color,
            })
        };
        match self.color_mode {
            ColorMode::Cmyk => Process::ALL.into_iter().filter_map(process_ink).collect(),
            ColorMode::Mono => process_ink(Process::Key).into_iter().collect(),
            ColorMode::Duotone | ColorMode::Tritone => {
                let total = self.color_mode.tone_count().unwrap_or(2);
                (0..total)
                    .filter_map(|i| {
                        let ch = self.channels.by_index(i);
                        ch.enabled.then(|| Ink {
                            label: TONE_LABELS[i],
                            separation: Separation::Tone { index: i, total },
                            angle: TONE_ANGLES[i],
                            frequency: ch.frequency,
                            size: ch.size,
                            color: self.custom_colors.get(i).copied().unwrap_or(Srgb::BLACK),
                        })
                    })
                    .collect()
            }
        }
    }
}

/// Normalizes an angle in degrees into [0, 360).
pub fn normalize_angle(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}
