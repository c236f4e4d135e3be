//! Terrain heights per flood cell.

use ev_core::{ElevationSampler, GeoBounds, LocalProjection};

use crate::{CellCoord, FloodError, FloodResult, GridDims, GridGeometry};

/// One immutable terrain height per flood cell plus the grid's placement.
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    pub(crate) dims:     GridDims,
    pub(crate) geometry: GridGeometry,
    pub(crate) heights:  Vec<f32>,
}

impl TerrainGrid {
    /// Wrap precomputed heights (row-major, `dims.cell_count()` values).
    pub fn from_heights(dims: GridDims, geometry: GridGeometry, heights: Vec<f32>) -> FloodResult<Self> {
        if heights.len() != dims.cell_count() {
            return Err(FloodError::DimensionMismatch {
                expected: dims.cell_count(),
                got: heights.len(),
            });
        }
        Ok(Self { dims, geometry, heights })
    }

    /// Sample `sampler` at every cell centre of a `resolution × resolution`
    /// grid spanning `bounds`.
    pub fn sample_from<E>(
        sampler: &E,
        projection: &LocalProjection,
        bounds: &GeoBounds,
        resolution: usize,
    ) -> FloodResult<Self>
    where
        E: ElevationSampler + ?Sized,
    {
        let dims = GridDims::new(resolution, resolution)?;
        let (min, max) = projection.extent(bounds);
        let geometry = GridGeometry::new(min, max)?;

        let mut out_of_bounds = 0usize;
        let mut heights = Vec::with_capacity(dims.cell_count());
        for index in 0..dims.cell_count() {
            let centre = geometry.cell_center(dims, dims.coord(index));
            let sample = sampler.height(projection.unproject(centre));
            if sample.is_out_of_bounds() {
                out_of_bounds += 1;
            }
            heights.push(sample.value());
        }
        if out_of_bounds > 0 {
            log::warn!(
                "{out_of_bounds} of {} terrain cells fell outside the elevation raster; clamped heights used",
                dims.cell_count()
            );
        }
        Ok(Self { dims, geometry, heights })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn height(&self, c: CellCoord) -> FloodResult<f32> {
        Ok(self.heights[self.dims.index(c)?])
    }
}
