//! The flood-height field.
//!
//! # Time stepping
//!
//! [`FloodField::update`] receives a frame length and a time multiplier.  The
//! scaled time first drives every [`WaterSource`], then feeds an accumulator
//! that is drained in fixed substeps.  At most `max_substeps` full substeps
//! run per call; if that cap is hit with time left over, the remainder is
//! integrated as one partial substep (all rates scaled by
//! `remainder / substep`) and the accumulator is emptied.  Below the cap the
//! sub-substep remainder simply carries into the next call.
//!
//! # Transport
//!
//! Each substep is a Jacobi update: outflows are planned for every cell
//! against the heights at the start of the substep, then applied together.

use ev_core::{FloodParams, GridSample, Vec2};

use crate::{CellCoord, FloodError, FloodResult, GridDims, GridGeometry, TerrainGrid};

/// Tolerance for float error in the non-negativity check.
const NEGATIVE_TOLERANCE: f32 = 1e-4;

// ── WaterSource ───────────────────────────────────────────────────────────────

/// A point inflow, in height units per simulated second.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaterSource {
    pub cell: CellCoord,
    pub rate: f32,
}

// ── StepReport ────────────────────────────────────────────────────────────────

/// What one [`FloodField::update`] call did.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Full substeps integrated.
    pub full_steps:    u32,
    /// Scale of the trailing partial substep, if one ran.
    pub partial_scale: Option<f32>,
    /// Water added by sources.
    pub injected:      f32,
}

// ── FloodField ────────────────────────────────────────────────────────────────

/// Water heights over a terrain grid.
#[derive(Clone, Debug)]
pub struct FloodField {
    dims:        GridDims,
    geometry:    GridGeometry,
    terrain:     Vec<f32>,
    water:       Vec<f32>,
    params:      FloodParams,
    sources:     Vec<WaterSource>,
    accumulator: f32,
    /// Per-cell planned outflows, one slot per neighbour direction.
    plan:        Vec<[f32; 4]>,
}

impl FloodField {
    /// A dry field over `terrain`.
    pub fn new(terrain: TerrainGrid, params: FloodParams) -> Self {
        let n = terrain.dims.cell_count();
        Self {
            dims:        terrain.dims,
            geometry:    terrain.geometry,
            terrain:     terrain.heights,
            water:       vec![0.0; n],
            params,
            sources:     Vec::new(),
            accumulator: 0.0,
            plan:        vec![[0.0; 4]; n],
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn params(&self) -> &FloodParams {
        &self.params
    }

    /// Water heights, row-major.
    pub fn water(&self) -> &[f32] {
        &self.water
    }

    /// Terrain heights, row-major.
    pub fn terrain(&self) -> &[f32] {
        &self.terrain
    }

    pub fn water_at(&self, c: CellCoord) -> FloodResult<f32> {
        Ok(self.water[self.dims.index(c)?])
    }

    /// Overwrite the water height of one cell.
    pub fn set_water(&mut self, c: CellCoord, height: f32) -> FloodResult<()> {
        if !(height >= 0.0 && height.is_finite()) {
            return Err(FloodError::InvalidRate(height));
        }
        let i = self.dims.index(c)?;
        self.water[i] = height;
        Ok(())
    }

    /// Sum of water heights over all cells.
    pub fn total_volume(&self) -> f64 {
        self.water.iter().map(|&h| h as f64).sum()
    }

    /// Time carried over to the next update.
    pub fn pending_secs(&self) -> f32 {
        self.accumulator
    }

    // ── Sources ───────────────────────────────────────────────────────────

    pub fn sources(&self) -> &[WaterSource] {
        &self.sources
    }

    /// Register a permanent inflow.  Returns the source's index.
    pub fn add_source(&mut self, cell: CellCoord, rate: f32) -> FloodResult<usize> {
        self.dims.index(cell)?;
        if !(rate >= 0.0 && rate.is_finite()) {
            return Err(FloodError::InvalidRate(rate));
        }
        self.sources.push(WaterSource { cell, rate });
        Ok(self.sources.len() - 1)
    }

    /// Register an inflow at the cell nearest a planar position.
    pub fn add_source_at(&mut self, xz: Vec2, rate: f32) -> FloodResult<usize> {
        match self.geometry.cell_at(self.dims, xz) {
            GridSample::Inside(cell) => self.add_source(cell, rate),
            GridSample::OutOfBounds { fallback } => Err(FloodError::CellOutOfBounds {
                col: fallback.col,
                row: fallback.row,
                cols: self.dims.cols(),
                rows: self.dims.rows(),
            }),
        }
    }

    /// Remove the source at `index`; later sources shift down by one.
    pub fn remove_source(&mut self, index: usize) -> Option<WaterSource> {
        (index < self.sources.len()).then(|| self.sources.remove(index))
    }

    // ── Injection ─────────────────────────────────────────────────────────

    /// Add `rate * dt` of water around `cell`: half stays in the cell and
    /// half is split evenly across its axis neighbours.  A cell without
    /// neighbours keeps everything.
    pub fn add_water_at(&mut self, cell: CellCoord, rate: f32, dt: f32) -> FloodResult<()> {
        let i = self.dims.index(cell)?;
        if !(rate >= 0.0 && rate.is_finite()) {
            return Err(FloodError::InvalidRate(rate));
        }
        let amount = rate * dt.max(0.0);
        let neighbors = self.dims.neighbors(i);
        let n = neighbors.iter().flatten().count();
        if n == 0 {
            self.water[i] += amount;
            return Ok(());
        }
        self.water[i] += amount * 0.5;
        let share = amount * 0.5 / n as f32;
        for j in neighbors.into_iter().flatten() {
            self.water[j] += share;
        }
        Ok(())
    }

    // ── Integration ───────────────────────────────────────────────────────

    /// Advance by frame length `dt` scaled by `time_multiplier`.
    pub fn update(&mut self, dt: f32, time_multiplier: f32) -> StepReport {
        let scaled = (dt * time_multiplier).max(0.0);
        let mut report = StepReport::default();

        for k in 0..self.sources.len() {
            let WaterSource { cell, rate } = self.sources[k];
            // Sources were validated on insertion.
            if self.add_water_at(cell, rate, scaled).is_ok() {
                report.injected += rate * scaled;
            }
        }

        self.accumulator += scaled;
        let substep = self.params.substep_secs;
        while self.accumulator >= substep && report.full_steps < self.params.max_substeps {
            self.step();
            self.accumulator -= substep;
            report.full_steps += 1;
        }

        if report.full_steps == self.params.max_substeps && self.accumulator > 0.0 {
            let scale = self.accumulator / substep;
            self.step_scaled(scale);
            self.accumulator = 0.0;
            report.partial_scale = Some(scale);
            log::trace!("flood update hit the substep cap; partial step scale {scale:.3}");
        }
        report
    }

    /// One full fixed substep.
    pub fn step(&mut self) {
        self.step_scaled(1.0);
    }

    /// One substep with its duration (and evaporation) scaled by `scale`.
    pub fn step_scaled(&mut self, scale: f32) {
        let dt = self.params.substep_secs * scale;
        self.plan_outflows(dt);

        for i in 0..self.water.len() {
            let flows = self.plan[i];
            let neighbors = self.dims.neighbors(i);
            let mut out = 0.0;
            for (slot, j) in neighbors.into_iter().enumerate() {
                if let Some(j) = j {
                    self.water[j] += flows[slot];
                    out += flows[slot];
                }
            }
            self.water[i] -= out;
        }

        let evaporation = self.params.evaporation * scale;
        for h in &mut self.water {
            debug_assert!(*h >= -NEGATIVE_TOLERANCE, "water height went negative: {h}");
            *h = (*h - evaporation).max(0.0);
        }
    }

    /// Fill `self.plan` with each cell's outflows for a substep of `dt`.
    fn plan_outflows(&mut self, dt: f32) {
        let (dims, terrain, water) = (self.dims, &self.terrain, &self.water);
        let params = &self.params;

        #[cfg(not(feature = "parallel"))]
        {
            for (i, slot) in self.plan.iter_mut().enumerate() {
                *slot = cell_outflows(i, dt, dims, terrain, water, params);
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.plan
                .par_iter_mut()
                .enumerate()
                .for_each(|(i, slot)| *slot = cell_outflows(i, dt, dims, terrain, water, params));
        }
    }

    // ── Sampling ──────────────────────────────────────────────────────────

    /// Water height at the cell nearest `xz`.
    pub fn sample_at(&self, xz: Vec2) -> GridSample<f32> {
        self.geometry
            .cell_at(self.dims, xz)
            .map(|c| self.water[c.row * self.dims.cols() + c.col])
    }

    /// `true` if the nearest cell holds more than the minimum water height.
    /// Positions outside the grid count as dry.
    pub fn is_flooded_at(&self, xz: Vec2) -> bool {
        self.sample_at(xz)
            .inside()
            .is_some_and(|h| h > self.params.min_water_height)
    }

    /// Count of cells above the minimum water height.
    pub fn flooded_cells(&self) -> usize {
        self.water.iter().filter(|&&h| h > self.params.min_water_height).count()
    }
}

/// Outflows from cell `i` toward each neighbour slot for a substep of `dt`.
fn cell_outflows(
    i: usize,
    dt: f32,
    dims: GridDims,
    terrain: &[f32],
    water: &[f32],
    params: &FloodParams,
) -> [f32; 4] {
    let mut flows = [0.0f32; 4];
    let h = water[i];
    if h <= params.min_water_height {
        return flows;
    }

    let neighbors = dims.neighbors(i);
    let n = neighbors.iter().flatten().count();
    if n == 0 {
        return flows;
    }
    let cap = h / n as f32;
    let drive = dt * params.gravity * h.sqrt() * params.friction;
    let surface = terrain[i] + h;

    let mut total = 0.0;
    for (slot, j) in neighbors.into_iter().enumerate() {
        let Some(j) = j else { continue };
        let head = surface - (terrain[j] + water[j]);
        if head > 0.0 {
            let flow = (drive * head).min(cap);
            flows[slot] = flow;
            total += flow;
        }
    }

    if total > h {
        let correction = h / total;
        for f in &mut flows {
            *f *= correction;
        }
    }
    flows
}
