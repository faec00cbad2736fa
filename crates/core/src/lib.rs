#![deny(unsafe_code)]
//! Core types for the halftone engine.
//!
//! Provides the `Settings` snapshot and per-pass `Ink` plan, color
//! separation, the rotated screen `GridTransform`, the per-pixel
//! `PatternField` (sixteen dot patterns plus the gooey metaball field),
//! explicit `DotShape`s for the grid sampler, the `Coverage`/`InkSampler`
//! point-evaluation traits, `Field` coverage planes, and multiply
//! compositing into an RGBA `Raster`.

pub mod color;
pub mod composite;
pub mod coverage;
pub mod error;
pub mod field;
pub mod grid;
pub mod pattern;
pub mod raster;
pub mod separation;
pub mod settings;
pub mod shape;

pub use color::{Srgb, PAPER};
pub use composite::{Background, Compositor};
pub use coverage::{ChannelView, Coverage, InkSampler};
pub use error::HalftoneError;
pub use field::Field;
pub use grid::{Cell, GridTransform};
pub use pattern::{metaball_influence, HalftoneField, PatternField};
pub use raster::Raster;
pub use separation::{rgb_to_cmyk, separate, Cmyk, Process, Separation};
pub use settings::{Channel, Channels, ColorMode, Ink, Pattern, Settings, PATTERN_COUNT, TONE_ANGLES};
pub use shape::{Dot, DotShape, PlacedDot};
