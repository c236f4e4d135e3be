//! Deterministic per-agent and simulation-level RNG wrappers.
//!
//! Every agent draws its speeds and reaction delay from its own `SmallRng`
//! seeded by
//!
//!   seed = global_seed XOR (agent_id * MIXING_CONSTANT)
//!
//! so a population is reproducible from one seed, and growing the population
//! does not change the draws of agents that already existed.  Spawn placement
//! uses the single `SimRng` in population order.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{AgentId, ValueRange};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-agent deterministic RNG.
pub struct AgentRng(SmallRng);

impl AgentRng {
    pub fn new(global_seed: u64, agent: AgentId) -> Self {
        let seed = global_seed ^ (agent.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform draw from `range`; a collapsed range returns its bound.
    #[inline]
    pub fn sample(&mut self, range: ValueRange) -> f32 {
        sample_range(&mut self.0, range)
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for setup-time draws (spawn cells, jitter).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform `f64` in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    #[inline]
    pub fn sample(&mut self, range: ValueRange) -> f32 {
        sample_range(&mut self.0, range)
    }
}

fn sample_range(rng: &mut SmallRng, range: ValueRange) -> f32 {
    if range.max > range.min {
        rng.gen_range(range.min..range.max)
    } else {
        range.min
    }
}
