//! Road graph storage.
//!
//! # Data layout
//!
//! Nodes live in an arena (`Vec<Option<Node>>`) addressed by [`NodeId`].
//! Removing a node leaves a tombstone, so ids handed out earlier never get
//! reused or shifted.  Each node owns its outgoing adjacency as a small
//! `Vec<(NodeId, weight)>` with map semantics: re-adding an edge overwrites
//! its weight, and iteration follows insertion order.
//!
//! # Node identity
//!
//! Two geometrically coincident points must resolve to the same node even
//! when they come from different polylines.  Positions are quantized to
//! centimetres ([`NodeKey`]) and looked up in an `FxHashMap` before a new
//! node is allocated.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over the planar `(x, z)` footprint answers
//! nearest-node queries for spawn snapping.  It is kept in sync with
//! insertions and removals.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use ev_core::{NodeId, Vec2, Vec3};

use crate::{GraphError, GraphResult};

/// Quantization factor: keys are integer centimetres.
const KEY_SCALE: f64 = 100.0;

// ── NodeKey ───────────────────────────────────────────────────────────────────

/// Quantized position used as a node's identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeKey(pub i64, pub i64, pub i64);

impl NodeKey {
    /// Quantize `pos` to centimetres, rounding half away from zero.
    ///
    /// Returns `None` for non-finite positions.
    pub fn from_position(pos: Vec3) -> Option<NodeKey> {
        if !pos.is_finite() {
            return None;
        }
        let q = |v: f32| (v as f64 * KEY_SCALE).round() as i64;
        Some(NodeKey(q(pos.x), q(pos.y), q(pos.z)))
    }
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
struct NodeEntry {
    point: [f32; 2], // [x, z]
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dz = self.point[1] - point[1];
        dx * dx + dz * dz
    }
}

// ── Node ──────────────────────────────────────────────────────────────────────

/// A road-network vertex.
#[derive(Clone, Debug)]
pub struct Node {
    pub pos:   Vec3,
    key:       NodeKey,
    neighbors: Vec<(NodeId, f32)>,
}

impl Node {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Outgoing `(neighbor, weight)` pairs in insertion order.
    pub fn neighbors(&self) -> &[(NodeId, f32)] {
        &self.neighbors
    }
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed, weighted road graph with stable node ids.
#[derive(Clone, Default)]
pub struct RoadGraph {
    nodes:       Vec<Option<Node>>,
    index:       FxHashMap<NodeKey, NodeId>,
    spatial_idx: RTree<NodeEntry>,
    live:        usize,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Length of the node arena, including tombstones.  Dense per-node
    /// arrays indexed by `NodeId` must have this length.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().flatten().map(|n| n.neighbors.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    #[inline]
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.node(id).map(|n| n.pos)
    }

    /// Outgoing edges of `id`; empty for unknown nodes.
    #[inline]
    pub fn neighbors(&self, id: NodeId) -> &[(NodeId, f32)] {
        self.node(id).map_or(&[], |n| n.neighbors.as_slice())
    }

    pub fn edge_weight(&self, from: NodeId, to: NodeId) -> Option<f32> {
        self.neighbors(from).iter().find(|(n, _)| *n == to).map(|&(_, w)| w)
    }

    /// The node whose quantized key matches `pos`, if any.
    pub fn find_node(&self, pos: Vec3) -> Option<NodeId> {
        NodeKey::from_position(pos).and_then(|k| self.index.get(&k).copied())
    }

    /// Live node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Every directed edge as `(from, to, weight)`, grouped by source in
    /// ascending id order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f32)> + '_ {
        self.nodes.iter().enumerate().flat_map(|(i, n)| {
            n.iter()
                .flat_map(move |n| n.neighbors.iter().map(move |&(to, w)| (NodeId(i as u32), to, w)))
        })
    }

    /// Nearest live node to a planar `(x, z)` position.
    pub fn nearest_node(&self, xz: Vec2) -> Option<NodeId> {
        self.spatial_idx.nearest_neighbor(&[xz.x, xz.y]).map(|e| e.id)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Insert a node at `pos`, or return the existing node with the same key.
    pub fn add_node(&mut self, pos: Vec3) -> GraphResult<NodeId> {
        let key = NodeKey::from_position(pos).ok_or(GraphError::NonFinitePosition {
            x: pos.x,
            y: pos.y,
            z: pos.z,
        })?;
        if let Some(&id) = self.index.get(&key) {
            return Ok(id);
        }
        let id = NodeId::try_from(self.nodes.len())
            .map_err(|_| GraphError::Source("node arena exhausted".into()))?;
        self.nodes.push(Some(Node { pos, key, neighbors: Vec::new() }));
        self.index.insert(key, id);
        self.spatial_idx.insert(NodeEntry { point: [pos.x, pos.z], id });
        self.live += 1;
        Ok(id)
    }

    /// Insert or overwrite the directed edge `from -> to`.
    ///
    /// Self-loops are not rejected.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, weight: f32) -> GraphResult<()> {
        if !(weight >= 0.0) || !weight.is_finite() {
            return Err(GraphError::InvalidWeight { from, to, weight });
        }
        if !self.contains(to) {
            return Err(GraphError::NodeNotFound(to));
        }
        let node = self
            .nodes
            .get_mut(from.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::NodeNotFound(from))?;
        match node.neighbors.iter_mut().find(|(n, _)| *n == to) {
            Some(edge) => edge.1 = weight,
            None => node.neighbors.push((to, weight)),
        }
        Ok(())
    }

    /// Insert edges in both directions with the same weight.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, weight: f32) -> GraphResult<()> {
        self.add_edge(a, b, weight)?;
        self.add_edge(b, a, weight)
    }

    /// Remove `id` and purge every edge pointing at it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Vec3> {
        let pos = self.position(id).ok_or(GraphError::NodeNotFound(id))?;
        self.remove_nodes(&[id]);
        Ok(pos)
    }

    /// Remove a batch of nodes in one adjacency sweep.  Unknown ids are
    /// ignored.  Returns how many nodes were removed.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) -> usize {
        let mut doomed = vec![false; self.nodes.len()];
        let mut removed = 0;
        for &id in ids {
            let Some(slot) = self.nodes.get_mut(id.index()) else { continue };
            let Some(node) = slot.take() else { continue };
            doomed[id.index()] = true;
            self.index.remove(&node.key);
            self.spatial_idx.remove(&NodeEntry { point: [node.pos.x, node.pos.z], id });
            removed += 1;
        }
        if removed == 0 {
            return 0;
        }
        for node in self.nodes.iter_mut().flatten() {
            node.neighbors.retain(|(n, _)| !doomed[n.index()]);
        }
        self.live -= removed;
        removed
    }

    // ── Connectivity ──────────────────────────────────────────────────────

    /// Weakly connected components, each in breadth-first order.
    ///
    /// Edges are followed in both directions so components never overlap,
    /// even with one-way edges.  Traversal starts from unvisited nodes in
    /// ascending id order.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let n = self.nodes.len();
        let mut undirected: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for (from, to, _) in self.edges() {
            undirected[from.index()].push(to);
            undirected[to.index()].push(from);
        }

        let mut visited = vec![false; n];
        let mut components = Vec::new();
        let mut queue = std::collections::VecDeque::new();

        for start in self.node_ids() {
            if visited[start.index()] {
                continue;
            }
            visited[start.index()] = true;
            queue.push_back(start);
            let mut component = Vec::new();
            while let Some(cur) = queue.pop_front() {
                component.push(cur);
                for &next in &undirected[cur.index()] {
                    if !visited[next.index()] {
                        visited[next.index()] = true;
                        queue.push_back(next);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Keep only the largest component (first found on ties).  Returns the
    /// number of nodes removed.
    pub fn prune_to_largest(&mut self) -> usize {
        let components = self.connected_components();
        let Some(largest) = components
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, usize)>, (i, c)| match best {
                Some((_, len)) if len >= c.len() => best,
                _ => Some((i, c.len())),
            })
            .map(|(i, _)| i)
        else {
            return 0;
        };

        let doomed: Vec<NodeId> = components
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != largest)
            .flat_map(|(_, c)| c.iter().copied())
            .collect();
        let removed = self.remove_nodes(&doomed);
        log::info!(
            "road graph pruned: kept {} nodes, dropped {} nodes in {} minor components",
            self.live,
            removed,
            components.len().saturating_sub(1)
        );
        removed
    }
}
