//! Terrain elevation sampling.
//!
//! The simulation consumes elevation through the [`ElevationSampler`] trait so
//! that any raster source (GeoTIFF reader, synthetic test terrain, remote
//! service) can be plugged in.  [`ElevationRaster`] is the in-memory
//! implementation: a north-up grid of vertex heights over a [`GeoBounds`],
//! read with bilinear interpolation.

use crate::{CoreError, CoreResult, GeoBounds, GeoPoint, GridSample};

/// Slack, in pixels, for positions that land on the raster edge after a
/// projection round trip.
const EDGE_TOLERANCE: f64 = 1e-3;

/// Source of terrain heights at geographic positions.
///
/// Implementations must report positions outside their coverage as
/// [`GridSample::OutOfBounds`] instead of returning a bare zero.
pub trait ElevationSampler {
    /// Height in metres at `p`.
    fn height(&self, p: GeoPoint) -> GridSample<f32>;
}

/// A bounded elevation raster with bilinear interpolation.
///
/// Samples sit on grid vertices: column 0 is the western edge, column
/// `width - 1` the eastern edge, row 0 the northern edge.  Heights are
/// reported relative to the raster minimum so the lowest point of the study
/// area sits at zero.  Non-finite samples (no-data) are filled with the
/// minimum at construction.
#[derive(Clone, Debug)]
pub struct ElevationRaster {
    bounds: GeoBounds,
    width:  usize,
    height: usize,
    data:   Vec<f32>,
    min:    f32,
}

impl ElevationRaster {
    /// Build a raster from row-major samples (`width * height` values).
    pub fn new(bounds: GeoBounds, width: usize, height: usize, mut data: Vec<f32>) -> CoreResult<Self> {
        if width < 2 || height < 2 || data.len() != width * height {
            return Err(CoreError::RasterSize {
                expected: width * height,
                got: data.len(),
                width,
                height,
            });
        }
        let min = data
            .iter()
            .copied()
            .filter(|h| h.is_finite())
            .fold(f32::INFINITY, f32::min);
        let min = if min.is_finite() { min } else { 0.0 };
        for h in data.iter_mut().filter(|h| !h.is_finite()) {
            *h = min;
        }
        Ok(Self { bounds, width, height, data, min })
    }

    /// Build a raster by evaluating `f(lat, lon)` at every vertex.
    pub fn from_fn(
        bounds: GeoBounds,
        width: usize,
        height: usize,
        f: impl Fn(f64, f64) -> f32,
    ) -> CoreResult<Self> {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            let lat = bounds.max_lat - bounds.height_deg() * row as f64 / (height.max(2) - 1) as f64;
            for col in 0..width {
                let lon = bounds.min_lon + bounds.width_deg() * col as f64 / (width.max(2) - 1) as f64;
                data.push(f(lat, lon));
            }
        }
        Self::new(bounds, width, height, data)
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Raw minimum height that readings are offset by.
    pub fn min_height(&self) -> f32 {
        self.min
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Fractional `(col, row)` of `p`; may lie outside the grid.
    fn grid_coords(&self, p: GeoPoint) -> (f64, f64) {
        let col = (p.lon - self.bounds.min_lon) / self.bounds.width_deg() * (self.width - 1) as f64;
        let row = (self.bounds.max_lat - p.lat) / self.bounds.height_deg() * (self.height - 1) as f64;
        (col, row)
    }

    #[inline]
    fn raw(&self, col: usize, row: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Bilinear interpolation at in-range fractional coordinates.
    fn bilinear(&self, col: f64, row: f64) -> f32 {
        let c0 = (col.floor() as usize).min(self.width - 1);
        let r0 = (row.floor() as usize).min(self.height - 1);
        let c1 = (c0 + 1).min(self.width - 1);
        let r1 = (r0 + 1).min(self.height - 1);

        let fc = (col - c0 as f64) as f32;
        let fr = (row - r0 as f64) as f32;

        let top = self.raw(c0, r0) * (1.0 - fc) + self.raw(c1, r0) * fc;
        let bot = self.raw(c0, r1) * (1.0 - fc) + self.raw(c1, r1) * fc;
        top * (1.0 - fr) + bot * fr
    }
}

impl ElevationSampler for ElevationRaster {
    fn height(&self, p: GeoPoint) -> GridSample<f32> {
        let (col, row) = self.grid_coords(p);
        let max_col = (self.width - 1) as f64;
        let max_row = (self.height - 1) as f64;
        let inside = col.is_finite()
            && row.is_finite()
            && (-EDGE_TOLERANCE..=max_col + EDGE_TOLERANCE).contains(&col)
            && (-EDGE_TOLERANCE..=max_row + EDGE_TOLERANCE).contains(&row);

        if inside {
            let (col, row) = (col.clamp(0.0, max_col), row.clamp(0.0, max_row));
            GridSample::Inside(self.bilinear(col, row) - self.min)
        } else {
            let col = if col.is_finite() { col.clamp(0.0, max_col) } else { 0.0 };
            let row = if row.is_finite() { row.clamp(0.0, max_row) } else { 0.0 };
            GridSample::OutOfBounds { fallback: self.bilinear(col, row) - self.min }
        }
    }
}
