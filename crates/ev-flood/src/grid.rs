//! Grid addressing.
//!
//! Cells are stored row-major: `index = row * cols + col`.  Row 0 lies at
//! the southern edge of the extent (smallest `z`), column 0 at the western
//! edge (smallest `x`).  Cell centres sit on a lattice that spans the extent
//! edge to edge, so the corner cells are centred on the extent corners.

use ev_core::{GridSample, Vec2};

use crate::{FloodError, FloodResult};

// ── CellCoord ─────────────────────────────────────────────────────────────────

/// Column/row address of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellCoord {
    pub col: usize,
    pub row: usize,
}

impl CellCoord {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

// ── GridDims ──────────────────────────────────────────────────────────────────

/// Fixed grid dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GridDims {
    cols: usize,
    rows: usize,
}

impl GridDims {
    pub fn new(cols: usize, rows: usize) -> FloodResult<Self> {
        if cols == 0 || rows == 0 {
            return Err(FloodError::InvalidDimensions { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Linear index of `c`, or an error if it is outside the grid.
    pub fn index(&self, c: CellCoord) -> FloodResult<usize> {
        if c.col >= self.cols || c.row >= self.rows {
            return Err(FloodError::CellOutOfBounds {
                col: c.col,
                row: c.row,
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(c.row * self.cols + c.col)
    }

    #[inline]
    pub fn coord(&self, index: usize) -> CellCoord {
        CellCoord::new(index % self.cols, index / self.cols)
    }

    /// Axis neighbours of `index` in the order west, east, south, north.
    /// Slots beyond the grid edge are `None`.
    #[inline]
    pub fn neighbors(&self, index: usize) -> [Option<usize>; 4] {
        let CellCoord { col, row } = self.coord(index);
        [
            (col > 0).then(|| index - 1),
            (col + 1 < self.cols).then(|| index + 1),
            (row > 0).then(|| index - self.cols),
            (row + 1 < self.rows).then(|| index + self.cols),
        ]
    }

    #[inline]
    pub fn neighbor_count(&self, index: usize) -> usize {
        self.neighbors(index).iter().flatten().count()
    }
}

// ── GridGeometry ──────────────────────────────────────────────────────────────

/// Maps planar `(x, z)` positions to cells.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridGeometry {
    min: Vec2,
    max: Vec2,
}

impl GridGeometry {
    pub fn new(min: Vec2, max: Vec2) -> FloodResult<Self> {
        if !(min.is_finite() && max.is_finite()) || max.x <= min.x || max.y <= min.y {
            return Err(FloodError::DegenerateExtent);
        }
        Ok(Self { min, max })
    }

    /// One metre per cell with cell `(0, 0)` at the origin.
    pub fn unit(dims: GridDims) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new((dims.cols - 1).max(1) as f32, (dims.rows - 1).max(1) as f32),
        }
    }

    pub fn min(&self) -> Vec2 {
        self.min
    }

    pub fn max(&self) -> Vec2 {
        self.max
    }

    /// Planar centre of a cell.
    pub fn cell_center(&self, dims: GridDims, c: CellCoord) -> Vec2 {
        let fx = if dims.cols > 1 { c.col as f32 / (dims.cols - 1) as f32 } else { 0.0 };
        let fz = if dims.rows > 1 { c.row as f32 / (dims.rows - 1) as f32 } else { 0.0 };
        self.min + (self.max - self.min) * Vec2::new(fx, fz)
    }

    /// Nearest cell to `xz`.  Positions outside the extent report the
    /// nearest edge cell as fallback.
    pub fn cell_at(&self, dims: GridDims, xz: Vec2) -> GridSample<CellCoord> {
        let rel = (xz - self.min) / (self.max - self.min);
        let snap = |t: f32, n: usize| -> usize {
            if n <= 1 || !t.is_finite() {
                return 0;
            }
            (t.clamp(0.0, 1.0) * (n - 1) as f32).round() as usize
        };
        let cell = CellCoord::new(snap(rel.x, dims.cols), snap(rel.y, dims.rows));
        let inside = (0.0..=1.0).contains(&rel.x) && (0.0..=1.0).contains(&rel.y);
        if inside {
            GridSample::Inside(cell)
        } else {
            GridSample::OutOfBounds { fallback: cell }
        }
    }
}
