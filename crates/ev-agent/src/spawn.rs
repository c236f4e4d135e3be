//! Building-weighted spawn sampling.

use ev_core::{CoreError, CoreResult, GeoBounds, GeoPoint, SimRng};

/// Spawn-point distribution over the study area.
///
/// The bounds are split into `grid × grid` cells (`x` along longitude, `y`
/// along latitude).  Each cell is weighted by the number of building
/// centroids inside it; a sample picks a cell with probability proportional
/// to its weight and then a uniform point inside that cell.  With no
/// buildings inside the bounds the whole box is sampled uniformly.
#[derive(Clone, Debug)]
pub struct SpawnDensity {
    bounds:     GeoBounds,
    grid:       usize,
    lon_step:   f64,
    lat_step:   f64,
    /// Running building count, row-major from the south-west cell.
    cumulative: Vec<u32>,
}

impl SpawnDensity {
    pub fn new(bounds: GeoBounds, grid: usize, buildings: &[GeoPoint]) -> CoreResult<Self> {
        if grid == 0 {
            return Err(CoreError::Config("spawn grid must have at least one cell".into()));
        }
        let lon_step = bounds.width_deg() / grid as f64;
        let lat_step = bounds.height_deg() / grid as f64;

        let mut counts = vec![0u32; grid * grid];
        for b in buildings {
            let x = ((b.lon - bounds.min_lon) / lon_step).floor();
            let y = ((b.lat - bounds.min_lat) / lat_step).floor();
            if x >= 0.0 && y >= 0.0 && (x as usize) < grid && (y as usize) < grid {
                counts[y as usize * grid + x as usize] += 1;
            }
        }

        let mut total = 0u32;
        let cumulative = counts
            .iter()
            .map(|&c| {
                total += c;
                total
            })
            .collect();

        Ok(SpawnDensity { bounds, grid, lon_step, lat_step, cumulative })
    }

    /// Number of buildings that fell inside the bounds.
    pub fn total_buildings(&self) -> u32 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn sample(&self, rng: &mut SimRng) -> GeoPoint {
        let total = self.total_buildings();
        if total == 0 {
            let b = &self.bounds;
            return GeoPoint::new(
                b.min_lat + rng.unit() * b.height_deg(),
                b.min_lon + rng.unit() * b.width_deg(),
            );
        }

        // First cell whose running count exceeds the draw; empty cells never win.
        let r = rng.unit() * total as f64;
        let cell = self
            .cumulative
            .partition_point(|&c| (c as f64) <= r)
            .min(self.cumulative.len() - 1);
        let (x, y) = (cell % self.grid, cell / self.grid);

        let min_lon = self.bounds.min_lon + x as f64 * self.lon_step;
        let min_lat = self.bounds.min_lat + y as f64 * self.lat_step;
        GeoPoint::new(
            min_lat + rng.unit() * self.lat_step,
            min_lon + rng.unit() * self.lon_step,
        )
    }
}
