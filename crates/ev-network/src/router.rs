//! Point-to-point routing.
//!
//! Agents navigate with the precomputed [`NextHopMap`](crate::NextHopMap).
//! The [`Router`] trait covers the other case: a single origin/destination
//! query, e.g. for presentation tooling or scenario checks.  The default
//! [`AStarRouter`] uses straight-line distance as its heuristic, which is
//! admissible because edge weights are road lengths.

use std::collections::BinaryHeap;

use ev_core::NodeId;

use crate::paths::HeapEntry;
use crate::{GraphError, GraphResult, RoadGraph};

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes to visit in order, including origin and destination.
    pub nodes:      Vec<NodeId>,
    /// Sum of edge weights along `nodes`.
    pub total_cost: f32,
}

impl Route {
    /// `true` if origin and destination coincide.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable point-to-point routing engine.
pub trait Router: Send + Sync {
    /// Route from `from` to `to`; [`GraphError::NoRoute`] if unreachable.
    fn route(&self, graph: &RoadGraph, from: NodeId, to: NodeId) -> GraphResult<Route>;
}

/// A* with a Euclidean heuristic.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarRouter;

impl Router for AStarRouter {
    fn route(&self, graph: &RoadGraph, from: NodeId, to: NodeId) -> GraphResult<Route> {
        graph.a_star(from, to)
    }
}

// ── A* internals ──────────────────────────────────────────────────────────────

impl RoadGraph {
    /// Shortest route from `start` to `goal` by A*.
    ///
    /// Equal-priority entries are expanded in insertion order, so results are
    /// reproducible.
    pub fn a_star(&self, start: NodeId, goal: NodeId) -> GraphResult<Route> {
        let goal_pos = self.position(goal).ok_or(GraphError::NodeNotFound(goal))?;
        if !self.contains(start) {
            return Err(GraphError::NodeNotFound(start));
        }
        if start == goal {
            return Ok(Route { nodes: vec![start], total_cost: 0.0 });
        }

        let n = self.capacity();
        let heuristic = |id: NodeId| self.position(id).map_or(0.0, |p| p.distance(goal_pos));

        let mut g = vec![f32::INFINITY; n];
        let mut came_from: Vec<Option<NodeId>> = vec![None; n];
        let mut closed = vec![false; n];

        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        g[start.index()] = 0.0;
        heap.push(HeapEntry { cost: heuristic(start), seq, node: start });

        while let Some(HeapEntry { node, .. }) = heap.pop() {
            if node == goal {
                return Ok(reconstruct(&came_from, goal, g[goal.index()]));
            }
            if closed[node.index()] {
                continue;
            }
            closed[node.index()] = true;

            let cost = g[node.index()];
            for &(next, w) in self.neighbors(node) {
                let tentative = cost + w;
                if tentative < g[next.index()] {
                    g[next.index()] = tentative;
                    came_from[next.index()] = Some(node);
                    seq += 1;
                    heap.push(HeapEntry { cost: tentative + heuristic(next), seq, node: next });
                }
            }
        }

        Err(GraphError::NoRoute { from: start, to: goal })
    }
}

fn reconstruct(came_from: &[Option<NodeId>], goal: NodeId, total_cost: f32) -> Route {
    let mut nodes = vec![goal];
    let mut cur = goal;
    while let Some(prev) = came_from[cur.index()] {
        nodes.push(prev);
        cur = prev;
    }
    nodes.reverse();
    Route { nodes, total_cost }
}
