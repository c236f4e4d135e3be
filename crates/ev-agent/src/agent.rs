//! A single evacuee.
//!
//! An `Agent` is plain data plus the movement primitives.  Per-tick
//! orchestration (flood checks, collision, hop lookup) lives in
//! [`Population::update`](crate::Population::update), which needs a view of
//! every other agent.

use ev_core::{AgentId, AgentParams, AgentRng, NodeId, Vec3};
use ev_network::NextHopMap;

/// Segments shorter than this count as already traversed.
const MIN_SEGMENT_LENGTH: f32 = 1e-4;

// ── AgentState ────────────────────────────────────────────────────────────────

/// Externally visible summary of an agent's flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentState {
    /// Still reacting to the alarm; has not moved yet.
    ReactionDelay,
    /// Travelling along its segment.
    Moving,
    /// Held at zero speed by the agent ahead.
    Blocked,
    /// Waiting at a node for a next hop.
    Idle,
    /// Reached a target node.
    Arrived,
    /// Standing on a node from which no target is reachable.
    Stranded,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::ReactionDelay => "reaction_delay",
            AgentState::Moving        => "moving",
            AgentState::Blocked       => "blocked",
            AgentState::Idle          => "idle",
            AgentState::Arrived       => "arrived",
            AgentState::Stranded      => "stranded",
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Segment ───────────────────────────────────────────────────────────────────

/// Straight leg from `start` to the graph node `to`.
///
/// `from` is `None` for the spawn leg, which starts at an arbitrary point
/// and walks onto the network.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub from:      Option<NodeId>,
    pub to:        NodeId,
    pub start:     Vec3,
    pub end:       Vec3,
    pub length:    f32,
    /// Unit vector from `start` to `end`; zero for a degenerate segment.
    pub direction: Vec3,
    /// Fraction traversed, in `[0, 1]`.
    pub progress:  f32,
}

impl Segment {
    pub fn new(from: Option<NodeId>, start: Vec3, to: NodeId, end: Vec3) -> Self {
        let delta = end - start;
        let length = delta.length();
        let degenerate = length < MIN_SEGMENT_LENGTH;
        Segment {
            from,
            to,
            start,
            end,
            length,
            direction: if degenerate { Vec3::ZERO } else { delta / length },
            progress:  if degenerate { 1.0 } else { 0.0 },
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }

    /// Position at the current progress.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.start.lerp(self.end, self.progress)
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Agent {
    pub id:                 AgentId,
    pub position:           Vec3,
    pub segment:            Segment,

    pub walk_speed:         f32,
    pub drive_speed:        f32,
    /// Speed used for the last movement, after collision adjustment.
    pub speed:              f32,
    /// Seconds left before the agent starts moving.
    pub reaction_remaining: f32,

    pub active:             bool,
    pub is_idle:            bool,
    pub is_driving:         bool,
    /// Sticky: once set the agent walks for the rest of the run.
    pub in_flood:           bool,
    pub reached_target:     bool,
    pub stranded:           bool,
    pub blocked_by:         Option<AgentId>,
    pub arrived_at:         Option<NodeId>,
}

impl Agent {
    /// A fresh agent at `position`, walking onto node `nearest` at `node_pos`.
    pub fn new(
        id: AgentId,
        position: Vec3,
        nearest: NodeId,
        node_pos: Vec3,
        walk_speed: f32,
        drive_speed: f32,
        reaction_time: f32,
    ) -> Self {
        Agent {
            id,
            position,
            segment: Segment::new(None, position, nearest, node_pos),
            walk_speed,
            drive_speed,
            speed: 0.0,
            reaction_remaining: reaction_time.max(0.0),
            active: true,
            is_idle: reaction_time > 0.0,
            is_driving: false,
            in_flood: false,
            reached_target: false,
            stranded: false,
            blocked_by: None,
            arrived_at: None,
        }
    }

    /// Draw speeds and reaction time from the agent's own RNG stream.
    pub fn spawn(
        id: AgentId,
        position: Vec3,
        nearest: NodeId,
        node_pos: Vec3,
        params: &AgentParams,
        rng: &mut AgentRng,
    ) -> Self {
        let reaction = rng.sample(params.reaction_time);
        let drive = rng.sample(params.drive_speed);
        let walk = rng.sample(params.walk_speed);
        Agent::new(id, position, nearest, node_pos, walk, drive, reaction)
    }

    /// Place the agent on an explicit segment.
    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.position = segment.position();
        self.segment = segment;
        self
    }

    #[inline]
    pub fn is_reacting(&self) -> bool {
        self.reaction_remaining > 0.0
    }

    pub fn state(&self) -> AgentState {
        if self.reached_target {
            AgentState::Arrived
        } else if self.stranded {
            AgentState::Stranded
        } else if self.is_reacting() {
            AgentState::ReactionDelay
        } else if self.is_idle {
            AgentState::Idle
        } else if self.blocked_by.is_some() && self.speed == 0.0 {
            AgentState::Blocked
        } else {
            AgentState::Moving
        }
    }

    /// Speed before collision adjustment.
    #[inline]
    pub fn nominal_speed(&self) -> f32 {
        if self.is_driving { self.drive_speed } else { self.walk_speed }
    }

    /// Count down the reaction delay.  Returns `true` while the agent should
    /// skip the rest of its update; the tick that exhausts the delay is
    /// consumed too.
    pub(crate) fn tick_reaction(&mut self, dt: f32) -> bool {
        if self.reaction_remaining <= 0.0 {
            return false;
        }
        self.reaction_remaining -= dt;
        if self.reaction_remaining <= 0.0 {
            self.reaction_remaining = 0.0;
            self.is_idle = false;
        }
        true
    }

    /// Mark the agent as caught by water: forced to walk from now on.
    pub(crate) fn enter_flood(&mut self) {
        self.in_flood = true;
        self.is_driving = false;
    }

    /// Advance along the current segment at `self.speed` for `dt` seconds.
    pub(crate) fn move_along_segment(&mut self, dt: f32) {
        let seg = &mut self.segment;
        if !seg.is_complete() && seg.length > 0.0 {
            seg.progress = (seg.progress + self.speed * dt / seg.length).min(1.0);
        }
        self.position = seg.position();
    }

    /// Handle a completed segment: arrive at a target, take the next hop,
    /// wait for one, or strand.
    pub(crate) fn on_node_reached(
        &mut self,
        is_target: bool,
        hops:      Option<&NextHopMap>,
        node_pos:  impl Fn(NodeId) -> Option<Vec3>,
    ) {
        let node = self.segment.to;
        if is_target {
            self.arrive(node);
            return;
        }
        let Some(map) = hops else {
            self.is_idle = true;
            return;
        };
        if !map.knows(node) {
            self.stranded = true;
            self.active = false;
            self.is_idle = false;
            return;
        }
        match map.next_hop(node).and_then(|next| node_pos(next).map(|p| (next, p))) {
            Some((next, pos)) => {
                self.segment = Segment::new(Some(node), self.segment.end, next, pos);
                self.is_idle = false;
                self.is_driving = !self.in_flood;
            }
            None => self.is_idle = true,
        }
    }

    fn arrive(&mut self, node: NodeId) {
        self.reached_target = true;
        self.arrived_at = Some(node);
        self.active = false;
        self.is_idle = false;
        self.blocked_by = None;
        self.speed = 0.0;
    }
}
