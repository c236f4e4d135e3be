//! Flood-subsystem error type.

use thiserror::Error;

use ev_core::CoreError;

/// Errors produced by `ev-flood`.
#[derive(Debug, Error)]
pub enum FloodError {
    #[error("grid must be at least 1x1, got {cols}x{rows}")]
    InvalidDimensions { cols: usize, rows: usize },

    #[error("expected {expected} cell heights, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cell ({col}, {row}) is outside the {cols}x{rows} grid")]
    CellOutOfBounds { col: usize, row: usize, cols: usize, rows: usize },

    #[error("water rate must be finite and non-negative, got {0}")]
    InvalidRate(f32),

    #[error("degenerate grid extent")]
    DegenerateExtent,

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type FloodResult<T> = Result<T, FloodError>;
