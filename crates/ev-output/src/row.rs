//! Flat records handed to the backends.

use ev_agent::{Agent, AgentState, PopulationCounts};
use ev_core::{NodeId, Tick, Vec3Swizzles};
use ev_flood::FloodField;
use ev_sim::TickSummary;

/// One agent at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSnapshotRow {
    pub agent_id:    u32,
    pub tick:        u64,
    pub x:           f32,
    pub y:           f32,
    pub z:           f32,
    pub state:       AgentState,
    pub in_flood:    bool,
    pub is_driving:  bool,
    /// Water height in the agent's cell; 0 outside the flood grid.
    pub water_depth: f32,
}

impl AgentSnapshotRow {
    pub fn from_agent(tick: Tick, agent: &Agent, flood: &FloodField) -> Self {
        let p = agent.position;
        Self {
            agent_id:    agent.id.0,
            tick:        tick.0,
            x:           p.x,
            y:           p.y,
            z:           p.z,
            state:       agent.state(),
            in_flood:    agent.in_flood,
            is_driving:  agent.is_driving,
            water_depth: flood.sample_at(p.xz()).inside().unwrap_or(0.0),
        }
    }
}

/// Population counts and flood volume after one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:         u64,
    pub sim_secs:     f64,
    pub active:       u64,
    pub idle:         u64,
    pub arrived:      u64,
    pub stranded:     u64,
    pub flooded:      u64,
    pub water_volume: f64,
}

impl From<&TickSummary> for TickSummaryRow {
    fn from(s: &TickSummary) -> Self {
        let PopulationCounts { active, idle, arrived, stranded, flooded, .. } = s.counts;
        Self {
            tick:         s.tick.0,
            sim_secs:     s.sim_secs,
            active:       active as u64,
            idle:         idle as u64,
            arrived:      arrived as u64,
            stranded:     stranded as u64,
            flooded:      flooded as u64,
            water_volume: s.water_volume,
        }
    }
}

/// A next-hop map going live for a new target set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEventRow {
    /// Tick during which the map was installed.
    pub tick:       u64,
    pub generation: u64,
    pub targets:    Vec<u32>,
}

impl RouteEventRow {
    pub fn new(tick: Tick, generation: u64, targets: &[NodeId]) -> Self {
        Self {
            tick: tick.0,
            generation,
            targets: targets.iter().map(|t| t.0).collect(),
        }
    }

    /// Targets as a space-separated id list.
    pub fn targets_joined(&self) -> String {
        let ids: Vec<String> = self.targets.iter().map(u32::to_string).collect();
        ids.join(" ")
    }
}
