//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` where a
//! configuration or raster problem bubbles up through them.

use thiserror::Error;

/// The error type for `ev-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid range for {what}: [{min}, {max}]")]
    InvalidRange {
        what: &'static str,
        min:  f32,
        max:  f32,
    },

    #[error("raster has {got} samples, expected {expected} ({width}x{height})")]
    RasterSize {
        expected: usize,
        got:      usize,
        width:    usize,
        height:   usize,
    },

    #[error("degenerate bounds: {0}")]
    DegenerateBounds(String),
}

/// Shorthand result type for `ev-core`.
pub type CoreResult<T> = Result<T, CoreError>;
