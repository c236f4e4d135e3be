//! The full set of evacuees and the per-tick update loop.

use std::collections::BTreeMap;

use ev_core::{
    AgentId, AgentParams, AgentRng, CollisionParams, ElevationSampler, LocalProjection, NodeId,
    SimRng, Vec3, Vec3Swizzles,
};
use ev_flood::FloodField;
use ev_network::{NextHopMap, RoadGraph, TargetSet};
use log::{debug, info};

use crate::{avoid_collisions, Agent, AgentError, AgentGrid, AgentResult, AgentState, Avoidance, SpawnDensity};

// ── StepContext ───────────────────────────────────────────────────────────────

/// Read-only world state an agent update needs.
pub struct StepContext<'a> {
    pub graph:     &'a RoadGraph,
    /// `None` while no next-hop map is installed; agents wait idle at nodes.
    pub next_hops: Option<&'a NextHopMap>,
    pub targets:   &'a TargetSet,
    pub flood:     &'a FloodField,
    pub collision: &'a CollisionParams,
}

// ── PopulationCounts ──────────────────────────────────────────────────────────

/// Aggregate agent counts after a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PopulationCounts {
    pub total:      usize,
    /// `total - arrived - idle - stranded`.
    pub active:     usize,
    /// Agents in reaction delay or waiting at a node for a route.
    pub idle:       usize,
    pub arrived:    usize,
    /// Agents that have ever touched flood water, arrived ones included.
    pub flooded:    usize,
    pub stranded:   usize,
    pub blocked:    usize,
    /// Arrivals per target node, ascending by node.
    pub per_target: Vec<(NodeId, usize)>,
}

impl PopulationCounts {
    /// `true` once no agent can move again.
    pub fn is_settled(&self) -> bool {
        self.arrived + self.stranded == self.total
    }
}

// ── Population ────────────────────────────────────────────────────────────────

pub struct Population {
    agents: Vec<Agent>,
    grid:   AgentGrid,
}

impl Population {
    /// Wrap pre-built agents.  Agent `i` must carry `AgentId(i)`.
    pub fn new(agents: Vec<Agent>, collision: &CollisionParams) -> Self {
        debug_assert!(agents.iter().enumerate().all(|(i, a)| a.id.index() == i));
        let grid = AgentGrid::new(collision.safe_distance * 2.0, agents.len());
        Population { agents, grid }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Advance every active agent by `dt` seconds, in id order.
    pub fn update(&mut self, dt: f32, ctx: &StepContext<'_>) -> PopulationCounts {
        self.rebuild_grid(ctx.collision);
        for i in 0..self.agents.len() {
            self.update_agent(i, dt, ctx);
        }
        self.counts()
    }

    /// Cells follow the tick's safe distance so the 3 × 3 query covers the
    /// full collision reach.
    fn rebuild_grid(&mut self, collision: &CollisionParams) {
        self.grid.set_cell_size(collision.safe_distance * 2.0);
        self.grid.clear();
        for (i, a) in self.agents.iter().enumerate() {
            if a.active {
                self.grid.insert(i, a.position.xz());
            }
        }
    }

    fn update_agent(&mut self, i: usize, dt: f32, ctx: &StepContext<'_>) {
        {
            let agent = &mut self.agents[i];
            if !agent.active || agent.tick_reaction(dt) {
                return;
            }
            if !agent.in_flood && ctx.flood.is_flooded_at(agent.position.xz()) {
                debug!("{} entered flood water at {:?}", agent.id, agent.position);
                agent.enter_flood();
            }
            if agent.segment.is_complete() {
                reach_node(agent, ctx);
            }
        }
        if !self.agents[i].active {
            self.grid.remove(i);
            return;
        }

        let agent = &self.agents[i];
        let nominal = agent.nominal_speed();
        let avoidance = if agent.in_flood || agent.is_idle {
            Avoidance { speed: nominal, blocked_by: None }
        } else {
            avoid_collisions(i, &self.agents, &self.grid, ctx.collision, nominal)
        };

        let agent = &mut self.agents[i];
        agent.speed = avoidance.speed;
        agent.blocked_by = avoidance.blocked_by;
        let was_complete = agent.segment.is_complete();
        agent.move_along_segment(dt);
        if !was_complete && agent.segment.is_complete() {
            reach_node(agent, ctx);
        }

        if agent.active {
            let xz = agent.position.xz();
            self.grid.relocate(i, xz);
        } else {
            self.grid.remove(i);
        }
    }

    /// Recount from current agent flags.
    pub fn counts(&self) -> PopulationCounts {
        let mut c = PopulationCounts { total: self.agents.len(), ..Default::default() };
        let mut per_target: BTreeMap<NodeId, usize> = BTreeMap::new();
        for a in &self.agents {
            if a.in_flood {
                c.flooded += 1;
            }
            match a.state() {
                AgentState::Arrived => {
                    c.arrived += 1;
                    if let Some(node) = a.arrived_at {
                        *per_target.entry(node).or_default() += 1;
                    }
                }
                AgentState::Stranded => c.stranded += 1,
                AgentState::ReactionDelay | AgentState::Idle => c.idle += 1,
                AgentState::Blocked => c.blocked += 1,
                AgentState::Moving => {}
            }
        }
        c.active = c.total - c.arrived - c.idle - c.stranded;
        c.per_target = per_target.into_iter().collect();
        c
    }
}

fn reach_node(agent: &mut Agent, ctx: &StepContext<'_>) {
    let node = agent.segment.to;
    let graph = ctx.graph;
    agent.on_node_reached(ctx.targets.contains(node), ctx.next_hops, |n| graph.position(n));
    if agent.reached_target {
        debug!("{} arrived at {}", agent.id, node);
    }
}

// ── PopulationBuilder ─────────────────────────────────────────────────────────

/// Spawns agents onto a road graph.
///
/// Each agent draws a spawn point from a [`SpawnDensity`], lifts it onto the
/// terrain, jitters it horizontally and then walks to the nearest graph node.
pub struct PopulationBuilder {
    count:     usize,
    seed:      u64,
    params:    AgentParams,
    collision: CollisionParams,
}

impl PopulationBuilder {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            params: AgentParams::default(),
            collision: CollisionParams::default(),
        }
    }

    pub fn agent_params(mut self, params: AgentParams) -> Self {
        self.params = params;
        self
    }

    pub fn collision(mut self, collision: CollisionParams) -> Self {
        self.collision = collision;
        self
    }

    /// Spawn `count` agents from `density`.
    pub fn build<E: ElevationSampler + ?Sized>(
        self,
        graph:      &RoadGraph,
        density:    &SpawnDensity,
        projection: &LocalProjection,
        elevation:  &E,
    ) -> AgentResult<Population> {
        let mut rng = SimRng::new(self.seed);
        let jitter = self.params.spawn_jitter_m;
        let mut positions = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            let geo = density.sample(&mut rng);
            let height = elevation.height(geo).value();
            let mut pos = projection.project_with_height(geo, height);
            pos.x += ((rng.unit() - 0.5) * 2.0 * jitter as f64) as f32;
            pos.z += ((rng.unit() - 0.5) * 2.0 * jitter as f64) as f32;
            positions.push(pos);
        }
        let population = self.build_at(graph, &positions)?;
        info!(
            "spawned {} agents over {} buildings",
            population.len(),
            density.total_buildings()
        );
        Ok(population)
    }

    /// Spawn one agent at each of `positions`.
    pub fn build_at(self, graph: &RoadGraph, positions: &[Vec3]) -> AgentResult<Population> {
        let mut agents = Vec::with_capacity(positions.len());
        for (i, &pos) in positions.iter().enumerate() {
            let id = AgentId::try_from(i).map_err(|_| AgentError::TooManyAgents(positions.len()))?;
            let nearest = graph.nearest_node(pos.xz()).ok_or(AgentError::EmptyGraph)?;
            let node_pos = graph
                .position(nearest)
                .ok_or(ev_network::GraphError::NodeNotFound(nearest))?;
            let mut rng = AgentRng::new(self.seed, id);
            agents.push(Agent::spawn(id, pos, nearest, node_pos, &self.params, &mut rng));
        }
        Ok(Population::new(agents, &self.collision))
    }
}
