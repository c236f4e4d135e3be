//! Simulation observer trait for progress reporting and data collection.

use ev_agent::{Agent, PopulationCounts};
use ev_core::{NodeId, Tick};
use ev_flood::FloodField;

/// Aggregate state at the end of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickSummary {
    pub tick:         Tick,
    /// Simulated seconds elapsed once this tick completed.
    pub sim_secs:     f64,
    /// Scaled step the tick advanced by.
    pub dt:           f32,
    pub counts:       PopulationCounts,
    pub water_volume: f64,
}

/// Callbacks invoked by [`Sim::tick`][crate::Sim::tick] and the run drivers.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter;
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, summary: &TickSummary) {
///         println!("{}: {} arrived", summary.tick, summary.counts.arrived);
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the start of each running tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each running tick.
    fn on_tick_end(&mut self, _summary: &TickSummary) {}

    /// Called every `config.output_interval_ticks` ticks with read-only
    /// access to agent and flood state.
    fn on_snapshot(&mut self, _tick: Tick, _agents: &[Agent], _flood: &FloodField) {}

    /// Called when a freshly computed next-hop map replaces the previous one.
    fn on_routes_installed(&mut self, _generation: u64, _targets: &[NodeId]) {}

    /// Called once when a run driver finishes.
    fn on_sim_end(&mut self, _final_tick: Tick, _counts: &PopulationCounts) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
