//! Forward-cone collision avoidance.
//!
//! An agent only yields to driving agents roughly straight ahead of it.  The
//! nearest such agent decides the speed:
//!
//! | Distance `d`           | Effect                                             |
//! |------------------------|----------------------------------------------------|
//! | `d < stop`             | stop, unless the obstacle is blocked by us and we are further along |
//! | `stop <= d < safe`     | `min(v, v * (d - stop) / (safe - stop) + 0.1)`     |
//! | `d >= safe`            | nominal speed                                      |
//!
//! The mutual-block exception breaks head-on face-offs: of two agents
//! blocking each other, the one with more progress keeps going.

use ev_core::{AgentId, CollisionParams, Vec3Swizzles};

use crate::{Agent, AgentGrid};

/// Additive floor in the slow-down zone so agents never crawl to a halt.
const SLOW_ZONE_FLOOR: f32 = 0.1;

/// Outcome of a collision check for one agent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Avoidance {
    pub speed:      f32,
    pub blocked_by: Option<AgentId>,
}

/// Decide the speed of `agents[me]` given its `nominal` speed.
///
/// Candidates come from `grid`; positions are read from `agents`, so agents
/// updated earlier in the tick are seen where they moved to.
pub fn avoid_collisions(
    me: usize,
    agents: &[Agent],
    grid: &AgentGrid,
    params: &CollisionParams,
    nominal: f32,
) -> Avoidance {
    let free = Avoidance { speed: nominal, blocked_by: None };
    let Some(agent) = agents.get(me) else {
        return free;
    };

    let reach = params.safe_distance * 2.0;
    let heading = agent.segment.direction;
    let mut nearest: Option<(f32, usize)> = None;

    grid.query_neighbors(agent.position.xz(), |j| {
        if j == me {
            return;
        }
        let Some(other) = agents.get(j) else {
            return;
        };
        if !other.active || !other.is_driving || other.is_reacting() {
            return;
        }
        let offset = other.position - agent.position;
        let d = offset.length();
        if d >= reach {
            return;
        }
        if offset.normalize_or_zero().dot(heading) < params.cone_cos {
            return;
        }
        let closer = match nearest {
            None => true,
            Some((best_d, best_j)) => d < best_d || (d == best_d && other.id < agents[best_j].id),
        };
        if closer {
            nearest = Some((d, j));
        }
    });

    let Some((d, j)) = nearest else {
        return free;
    };
    let other = &agents[j];

    if d < params.stop_distance {
        if other.blocked_by == Some(agent.id) && agent.segment.progress >= other.segment.progress {
            return free;
        }
        return Avoidance { speed: 0.0, blocked_by: Some(other.id) };
    }
    if d < params.safe_distance {
        let span = params.safe_distance - params.stop_distance;
        let factor = if span > 0.0 { (d - params.stop_distance) / span } else { 1.0 };
        let speed = nominal.min(nominal * factor + SLOW_ZONE_FLOOR);
        return Avoidance { speed, blocked_by: Some(other.id) };
    }
    free
}
