//! Run configuration.
//!
//! All tunables live in plain structs with `Default` impls, so a scenario can
//! override a handful of fields and keep the rest.  With the `serde` feature
//! every struct deserializes with missing fields falling back to defaults.

use crate::{CoreError, CoreResult};

// ── ValueRange ────────────────────────────────────────────────────────────────

/// Closed range a per-agent parameter is drawn from uniformly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A collapsed range that always yields `v`.
    pub const fn fixed(v: f32) -> Self {
        Self { min: v, max: v }
    }

    fn validate(&self, what: &'static str) -> CoreResult<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min < 0.0 || self.max < self.min {
            return Err(CoreError::InvalidRange { what, min: self.min, max: self.max });
        }
        Ok(())
    }
}

// ── AgentParams ───────────────────────────────────────────────────────────────

/// Per-agent behaviour ranges, fixed at spawn.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentParams {
    /// Walking speed in m/s.
    pub walk_speed:     ValueRange,
    /// Driving speed in m/s.
    pub drive_speed:    ValueRange,
    /// Delay before departure, in simulated seconds.
    pub reaction_time:  ValueRange,
    /// Half-width of the square jitter applied to spawn points, in metres.
    pub spawn_jitter_m: f32,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            walk_speed:     ValueRange::new(1.0, 3.0),
            drive_speed:    ValueRange::new(10.0, 20.0),
            reaction_time:  ValueRange::new(0.0, 300.0),
            spawn_jitter_m: 50.0,
        }
    }
}

// ── CollisionParams ───────────────────────────────────────────────────────────

/// Forward-cone collision avoidance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollisionParams {
    /// Agents closer than this slow down.
    pub safe_distance: f32,
    /// Agents closer than this stop.
    pub stop_distance: f32,
    /// Minimum cosine between heading and direction-to-obstacle.
    pub cone_cos:      f32,
}

impl Default for CollisionParams {
    fn default() -> Self {
        Self { safe_distance: 15.0, stop_distance: 10.0, cone_cos: 0.996 }
    }
}

// ── FloodParams ───────────────────────────────────────────────────────────────

/// Water transport constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FloodParams {
    pub gravity:          f32,
    pub friction:         f32,
    /// Fixed substep length in simulated seconds.
    pub substep_secs:     f32,
    /// Cells at or below this height neither flow nor flood agents.
    pub min_water_height: f32,
    /// Height removed from every cell per full substep.
    pub evaporation:      f32,
    /// Upper bound on full substeps per `update` call.
    pub max_substeps:     u32,
}

impl Default for FloodParams {
    fn default() -> Self {
        Self {
            gravity:          9.8,
            friction:         0.1,
            substep_secs:     0.016,
            min_water_height: 0.5,
            evaporation:      0.000_02,
            max_substeps:     10,
        }
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Number of evacuees to spawn.
    pub agent_count:           usize,
    /// Master RNG seed.
    pub seed:                  u64,
    /// Simulated seconds per wall-clock second.
    pub time_multiplier:       f32,
    /// Frames longer than this are treated as stalls.
    pub max_frame_secs:        f32,
    /// Frame length substituted for a stalled frame.
    pub stall_frame_secs:      f32,
    /// Observer snapshot cadence; 0 disables snapshots.
    pub output_interval_ticks: u64,
    /// Flood grid cells per side.
    pub terrain_resolution:    usize,
    /// Spawn density grid cells per side.
    pub spawn_grid:            usize,

    pub agents:    AgentParams,
    pub collision: CollisionParams,
    pub flood:     FloodParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agent_count:           200,
            seed:                  42,
            time_multiplier:       1.0,
            max_frame_secs:        1.0,
            stall_frame_secs:      1.0 / 60.0,
            output_interval_ticks: 60,
            terrain_resolution:    200,
            spawn_grid:            200,
            agents:                AgentParams::default(),
            collision:             CollisionParams::default(),
            flood:                 FloodParams::default(),
        }
    }
}

impl SimConfig {
    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        self.agents.walk_speed.validate("walk_speed")?;
        self.agents.drive_speed.validate("drive_speed")?;
        self.agents.reaction_time.validate("reaction_time")?;

        let positive = |v: f32| v.is_finite() && v > 0.0;
        let non_negative = |v: f32| v.is_finite() && v >= 0.0;

        if !non_negative(self.agents.spawn_jitter_m) {
            return Err(CoreError::Config("spawn_jitter_m must be >= 0".into()));
        }
        if !non_negative(self.time_multiplier) {
            return Err(CoreError::Config("time_multiplier must be >= 0".into()));
        }
        if !positive(self.max_frame_secs) || !positive(self.stall_frame_secs) {
            return Err(CoreError::Config("frame limits must be > 0".into()));
        }
        if self.terrain_resolution < 2 {
            return Err(CoreError::Config("terrain_resolution must be at least 2".into()));
        }
        if self.spawn_grid == 0 {
            return Err(CoreError::Config("spawn_grid must be at least 1".into()));
        }

        let c = &self.collision;
        if !positive(c.stop_distance) || !(c.safe_distance > c.stop_distance) || !c.safe_distance.is_finite() {
            return Err(CoreError::Config(format!(
                "collision distances need 0 < stop ({}) < safe ({})",
                c.stop_distance, c.safe_distance
            )));
        }
        if !(-1.0..=1.0).contains(&c.cone_cos) {
            return Err(CoreError::Config("cone_cos must lie in [-1, 1]".into()));
        }

        let f = &self.flood;
        if !positive(f.gravity) || !non_negative(f.friction) || !positive(f.substep_secs) {
            return Err(CoreError::Config("flood gravity, friction and substep must be positive".into()));
        }
        if !non_negative(f.min_water_height) || !non_negative(f.evaporation) {
            return Err(CoreError::Config("flood thresholds must be >= 0".into()));
        }
        if f.max_substeps == 0 {
            return Err(CoreError::Config("max_substeps must be at least 1".into()));
        }
        Ok(())
    }
}
