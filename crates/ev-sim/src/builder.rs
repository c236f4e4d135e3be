//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use ev_agent::Population;
use ev_core::{NodeId, SimClock, SimConfig};
use ev_flood::FloodField;
use ev_network::{GraphError, RoadGraph, TargetSet};
use log::info;

use crate::routes::{RouteMode, RouteWorker};
use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`] — seed, frame clamping, collision and flood parameters
/// - [`RoadGraph`] — the pruned road network
/// - [`FloodField`] — terrain grid plus any initial water sources
/// - [`Population`] — from [`ev_agent::PopulationBuilder`]
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                   |
/// |--------------------|---------------------------|
/// | `.targets(v)`      | No targets                |
/// | `.route_mode(m)`   | `RouteMode::Background`   |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, graph, flood, population)
///     .targets(vec![shelter])
///     .route_mode(RouteMode::Blocking)
///     .build()?;
/// sim.start();
/// sim.run_until_settled(1.0 / 60.0, 100_000, &mut NoopObserver);
/// ```
pub struct SimBuilder {
    config:     SimConfig,
    graph:      RoadGraph,
    flood:      FloodField,
    population: Population,
    targets:    Vec<NodeId>,
    route_mode: RouteMode,
}

impl SimBuilder {
    pub fn new(config: SimConfig, graph: RoadGraph, flood: FloodField, population: Population) -> Self {
        Self {
            config,
            graph,
            flood,
            population,
            targets:    Vec::new(),
            route_mode: RouteMode::default(),
        }
    }

    /// Initial target nodes.  Each must be a node of the graph.
    pub fn targets(mut self, targets: Vec<NodeId>) -> Self {
        self.targets = targets;
        self
    }

    pub fn route_mode(mut self, mode: RouteMode) -> Self {
        self.route_mode = mode;
        self
    }

    /// Validate inputs and return a paused [`Sim`].  When initial targets
    /// are given the first next-hop computation is already requested.
    pub fn build(self) -> SimResult<Sim> {
        self.config.validate()?;
        if self.graph.is_empty() {
            return Err(GraphError::EmptyNetwork.into());
        }
        if self.population.is_empty() {
            return Err(SimError::NoAgentsSpawned);
        }

        let mut targets = TargetSet::new();
        for &t in &self.targets {
            if !self.graph.contains(t) {
                return Err(SimError::UnknownTarget(t));
            }
            targets.add(t);
        }

        let worker = match self.route_mode {
            RouteMode::Background => Some(RouteWorker::spawn()?),
            RouteMode::Blocking => None,
        };

        info!(
            "simulation ready: {} nodes, {} edges, {} agents, {} targets, {:?} routing",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.population.len(),
            targets.len(),
            self.route_mode
        );

        let counts = self.population.counts();
        let mut sim = Sim {
            time_multiplier: self.config.time_multiplier,
            config:          self.config,
            clock:           SimClock::new(),
            graph:           Arc::new(self.graph),
            flood:           self.flood,
            population:      self.population,
            targets,
            next_hops:       None,
            route_mode:      self.route_mode,
            worker,
            running:         false,
            counts,
        };
        if !sim.targets.is_empty() {
            sim.request_routes()?;
        }
        Ok(sim)
    }
}
