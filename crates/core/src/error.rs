//! Error types for the halftone core.

use thiserror::Error;

/// Errors produced by halftone operations.
#[derive(Debug, Error)]
pub enum HalftoneError {
    /// Width or height was zero when creating a raster or coverage plane.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A pixel buffer did not have the length its dimensions require.
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A settings snapshot contained an unusable value.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The pass was cancelled before it completed.
    #[error("render pass cancelled")]
    Cancelled,

    /// Reading or writing an output file failed.
    #[error("i/o error: {0}")]
    Io(String),
}
