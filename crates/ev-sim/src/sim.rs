//! The `Sim` struct and its tick loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ev_agent::{Population, PopulationCounts, StepContext};
use ev_core::{NodeId, SimClock, SimConfig, Tick};
use ev_flood::FloodField;
use ev_network::{NextHopMap, RoadGraph, TargetSet};
use log::{debug, info, warn};

use crate::routes::{RouteMode, RouteWorker};
use crate::{SimError, SimObserver, SimResult, TickSummary};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Each running [`tick`](Self::tick) does, in order:
///
/// 1. **Routes**: install any next-hop map the worker finished whose
///    generation matches the current target set; discard stale ones.
/// 2. **Flood**: inject sources and integrate water with the scaled frame.
/// 3. **Agents**: update every agent in id order against the graph, the
///    installed next-hop map, the target set and the flood field.
/// 4. **Counts**: aggregate and report to the observer.
///
/// A paused sim ignores `tick`.  Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config: SimConfig,
    pub clock:  SimClock,

    pub(crate) graph:           Arc<RoadGraph>,
    pub(crate) flood:           FloodField,
    pub(crate) population:      Population,
    pub(crate) targets:         TargetSet,
    pub(crate) next_hops:       Option<Arc<NextHopMap>>,
    pub(crate) route_mode:      RouteMode,
    pub(crate) worker:          Option<RouteWorker>,
    pub(crate) running:         bool,
    pub(crate) time_multiplier: f32,
    pub(crate) counts:          PopulationCounts,
}

impl Sim {
    // ── Controls ──────────────────────────────────────────────────────────

    pub fn start(&mut self) {
        if !self.running {
            info!("simulation started at {}", self.clock);
        }
        self.running = true;
    }

    pub fn pause(&mut self) {
        if self.running {
            info!("simulation paused at {}", self.clock);
        }
        self.running = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time_multiplier(&self) -> f32 {
        self.time_multiplier
    }

    pub fn set_time_multiplier(&mut self, multiplier: f32) -> SimResult<()> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(SimError::InvalidTimeMultiplier(multiplier));
        }
        self.time_multiplier = multiplier;
        Ok(())
    }

    // ── Targets ───────────────────────────────────────────────────────────

    /// Add `node` to the target set.  Returns `false` if it already was one.
    pub fn add_target(&mut self, node: NodeId) -> SimResult<bool> {
        if !self.graph.contains(node) {
            return Err(SimError::UnknownTarget(node));
        }
        if !self.targets.add(node) {
            return Ok(false);
        }
        info!("target {node} added ({} total)", self.targets.len());
        self.request_routes()?;
        Ok(true)
    }

    /// Remove `node` from the target set.  Returns `false` if it was not one.
    pub fn remove_target(&mut self, node: NodeId) -> SimResult<bool> {
        if !self.targets.remove(node) {
            return Ok(false);
        }
        info!("target {node} removed ({} left)", self.targets.len());
        self.request_routes()?;
        Ok(true)
    }

    /// Recompute next hops for the current target set.
    ///
    /// The installed map is dropped first, so agents stop at their next node
    /// until the new one arrives.
    pub(crate) fn request_routes(&mut self) -> SimResult<()> {
        self.next_hops = None;
        let generation = self.targets.generation();
        match self.route_mode {
            RouteMode::Blocking => {
                let map = self
                    .graph
                    .compute_shortest_path(self.targets.as_slice())
                    .with_generation(generation);
                self.install(map, &mut crate::NoopObserver);
                Ok(())
            }
            RouteMode::Background => {
                let worker = self
                    .worker
                    .as_ref()
                    .ok_or_else(|| SimError::RouteWorker("no worker in background mode".into()))?;
                debug!("requesting next hops for generation {generation}");
                worker.request(Arc::clone(&self.graph), self.targets.as_slice().to_vec(), generation)
            }
        }
    }

    /// Install finished next-hop maps from the worker.
    pub fn poll_routes<O: SimObserver>(&mut self, observer: &mut O) {
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        for map in worker.drain() {
            self.install(map, observer);
        }
    }

    /// Block until a map for the current target set is installed, or
    /// `timeout` elapses.  Returns whether routes are current.
    pub fn wait_for_routes(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.routes_current() {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            let Some(map) = self.worker.as_ref().and_then(|w| w.recv_timeout(left)) else {
                return self.routes_current();
            };
            self.install(map, &mut crate::NoopObserver);
        }
        true
    }

    /// `true` if the installed map matches the current target set.
    pub fn routes_current(&self) -> bool {
        self.next_hops
            .as_ref()
            .is_some_and(|m| m.generation() == self.targets.generation())
    }

    fn install<O: SimObserver>(&mut self, map: NextHopMap, observer: &mut O) {
        let current = self.targets.generation();
        if map.generation() != current {
            debug!(
                "discarding stale next-hop map (generation {}, current {current})",
                map.generation()
            );
            return;
        }
        info!(
            "installed next hops for {} targets (generation {current})",
            map.targets().len()
        );
        observer.on_routes_installed(current, map.targets());
        self.next_hops = Some(Arc::new(map));
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Advance by one frame of `frame_secs` wall-clock seconds.
    ///
    /// Returns `false` without doing anything while paused.
    pub fn tick<O: SimObserver>(&mut self, frame_secs: f32, observer: &mut O) -> bool {
        if !self.running {
            return false;
        }
        let frame = if frame_secs > self.config.max_frame_secs {
            self.config.stall_frame_secs
        } else {
            frame_secs.max(0.0)
        };
        let dt = frame * self.time_multiplier;
        let now = self.clock.tick;

        observer.on_tick_start(now);
        self.poll_routes(observer);

        self.flood.update(frame, self.time_multiplier);

        let ctx = StepContext {
            graph:     &self.graph,
            next_hops: self.next_hops.as_deref(),
            targets:   &self.targets,
            flood:     &self.flood,
            collision: &self.config.collision,
        };
        self.counts = self.population.update(dt, &ctx);

        self.clock.advance(dt);
        let summary = TickSummary {
            tick:         now,
            sim_secs:     self.clock.elapsed_secs,
            dt,
            counts:       self.counts.clone(),
            water_volume: self.flood.total_volume(),
        };
        observer.on_tick_end(&summary);

        let interval = self.config.output_interval_ticks;
        if interval > 0 && now.is_every(interval) {
            observer.on_snapshot(now, self.population.agents(), &self.flood);
        }
        true
    }

    /// Run `n` ticks of `frame_secs` each.  Returns how many actually ran.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, frame_secs: f32, observer: &mut O) -> u64 {
        let mut ran = 0;
        for _ in 0..n {
            if !self.tick(frame_secs, observer) {
                break;
            }
            ran += 1;
        }
        observer.on_sim_end(self.clock.tick, &self.counts);
        ran
    }

    /// Tick until every agent has arrived or stranded, or `max_ticks` ran.
    /// Returns whether the population settled.
    pub fn run_until_settled<O: SimObserver>(
        &mut self,
        frame_secs: f32,
        max_ticks:  u64,
        observer:   &mut O,
    ) -> bool {
        let mut ran = 0;
        while !self.counts.is_settled() && ran < max_ticks {
            if !self.tick(frame_secs, observer) {
                warn!("run_until_settled called on a paused simulation");
                break;
            }
            ran += 1;
        }
        observer.on_sim_end(self.clock.tick, &self.counts);
        let settled = self.counts.is_settled();
        info!(
            "run ended at {} after {ran} ticks: {} arrived, {} stranded of {}",
            self.clock, self.counts.arrived, self.counts.stranded, self.counts.total
        );
        settled
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn flood(&self) -> &FloodField {
        &self.flood
    }

    /// Mutable flood access, e.g. to add or remove water sources mid-run.
    pub fn flood_mut(&mut self) -> &mut FloodField {
        &mut self.flood
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn next_hops(&self) -> Option<&NextHopMap> {
        self.next_hops.as_deref()
    }

    pub fn route_mode(&self) -> RouteMode {
        self.route_mode
    }

    /// Counts as of the last tick.
    pub fn counts(&self) -> &PopulationCounts {
        &self.counts
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.tick
    }
}
