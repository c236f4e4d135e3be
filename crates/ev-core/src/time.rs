//! Simulation time model.
//!
//! The simulation is frame-driven: each call to the orchestrator's `tick`
//! advances a `Tick` counter by one and simulated time by a variable,
//! already time-scaled number of seconds.  `SimClock` keeps both so output
//! can be keyed by tick while physics uses continuous seconds.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// Monotonic frame counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    /// `true` every `interval` ticks; an interval of zero never fires.
    #[inline]
    pub fn is_every(self, interval: u64) -> bool {
        interval != 0 && self.0 % interval == 0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Current tick plus accumulated simulated seconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimClock {
    pub tick:         Tick,
    pub elapsed_secs: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick covering `dt` simulated seconds.
    #[inline]
    pub fn advance(&mut self, dt: f32) {
        self.tick = self.tick + 1;
        self.elapsed_secs += dt.max(0.0) as f64;
    }

    /// Elapsed simulated time as `(hours, minutes, seconds)`.
    pub fn elapsed_hms(&self) -> (u64, u32, u32) {
        let total = self.elapsed_secs.max(0.0) as u64;
        (total / 3_600, ((total % 3_600) / 60) as u32, (total % 60) as u32)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = self.elapsed_hms();
        write!(f, "{} ({:02}:{:02}:{:02})", self.tick, h, m, s)
    }
}
