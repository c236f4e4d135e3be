//! Multi-target next-hop routing.
//!
//! Agents do not carry whole routes.  Instead the graph precomputes, for
//! every node, which neighbour to step to next in order to reach the nearest
//! member of the current [`TargetSet`].  One multi-source Dijkstra seeded at
//! every target answers this for all nodes at once; it runs again in full
//! whenever the target set changes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use ev_core::NodeId;

use crate::RoadGraph;

// ── Heap entry ────────────────────────────────────────────────────────────────

/// Min-heap entry ordered by cost, then by push sequence so that equal-cost
/// entries pop in insertion order.
#[derive(Copy, Clone, Debug)]
pub(crate) struct HeapEntry {
    pub cost: f32,
    pub seq:  u64,
    pub node: NodeId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Reversed: BinaryHeap is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ── NextHopMap ────────────────────────────────────────────────────────────────

/// Immutable result of a next-hop computation.
///
/// Indexed by `NodeId`.  Nodes that were not live when the map was computed
/// are *unknown*; live nodes that cannot reach any target have no hop.
#[derive(Clone, Debug, Default)]
pub struct NextHopMap {
    generation: u64,
    targets:    Vec<NodeId>,
    hops:       Vec<Option<NodeId>>,
    dist:       Vec<f32>,
    known:      Vec<bool>,
}

impl NextHopMap {
    /// Tag the map with the target-set generation it was computed for.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Targets the map was seeded with (live ones only).
    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    #[inline]
    pub fn is_target(&self, node: NodeId) -> bool {
        self.targets.contains(&node)
    }

    /// `true` if `node` was a live graph node when the map was computed.
    #[inline]
    pub fn knows(&self, node: NodeId) -> bool {
        self.known.get(node.index()).copied().unwrap_or(false)
    }

    /// Neighbour to step to from `node`, or `None` if `node` is a target,
    /// unreachable, or unknown.
    #[inline]
    pub fn next_hop(&self, node: NodeId) -> Option<NodeId> {
        self.hops.get(node.index()).copied().flatten()
    }

    /// Cost from `node` to its nearest target.
    #[inline]
    pub fn distance(&self, node: NodeId) -> Option<f32> {
        self.dist.get(node.index()).copied().filter(|d| d.is_finite())
    }

    /// Follow hops from `start` to a target.  Returns `None` if no target is
    /// reachable.
    pub fn path_from(&self, start: NodeId) -> Option<Vec<NodeId>> {
        self.distance(start)?;
        let mut path = vec![start];
        let mut cur = start;
        while !self.is_target(cur) {
            cur = self.next_hop(cur)?;
            path.push(cur);
            if path.len() > self.hops.len() + 1 {
                debug_assert!(false, "next-hop cycle through {cur}");
                return None;
            }
        }
        Some(path)
    }
}

impl RoadGraph {
    /// Compute next hops toward the nearest of `targets` for every node.
    ///
    /// Runs Dijkstra over reversed edges seeded at distance zero at every
    /// target.  When node `v` is settled, each predecessor `u` with an edge
    /// `u -> v` is offered `dist[v] + w(u, v)`; the predecessor's hop becomes
    /// `v` on strict improvement, so ties keep the first offer.  Targets that
    /// are not live nodes are skipped.
    pub fn compute_shortest_path(&self, targets: &[NodeId]) -> NextHopMap {
        let started = Instant::now();
        let n = self.capacity();

        let mut reverse: Vec<Vec<(NodeId, f32)>> = vec![Vec::new(); n];
        for (from, to, w) in self.edges() {
            reverse[to.index()].push((from, w));
        }

        let mut dist = vec![f32::INFINITY; n];
        let mut hops: Vec<Option<NodeId>> = vec![None; n];
        let mut settled = vec![false; n];
        let mut known = vec![false; n];
        for id in self.node_ids() {
            known[id.index()] = true;
        }

        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        let mut seeded = Vec::with_capacity(targets.len());

        for &t in targets {
            if !self.contains(t) {
                log::warn!("next-hop target {t} is not in the road graph; skipped");
                continue;
            }
            if dist[t.index()] == 0.0 {
                continue;
            }
            dist[t.index()] = 0.0;
            seeded.push(t);
            heap.push(HeapEntry { cost: 0.0, seq, node: t });
            seq += 1;
        }

        while let Some(HeapEntry { cost, node, .. }) = heap.pop() {
            if settled[node.index()] {
                continue;
            }
            settled[node.index()] = true;

            for &(pred, w) in &reverse[node.index()] {
                if settled[pred.index()] {
                    continue;
                }
                let candidate = cost + w;
                if candidate < dist[pred.index()] {
                    dist[pred.index()] = candidate;
                    hops[pred.index()] = Some(node);
                    heap.push(HeapEntry { cost: candidate, seq, node: pred });
                    seq += 1;
                }
            }
        }

        log::debug!(
            "next hops toward {} targets over {} nodes computed in {:?}",
            seeded.len(),
            self.node_count(),
            started.elapsed()
        );

        NextHopMap { generation: 0, targets: seeded, hops, dist, known }
    }
}

// ── TargetSet ─────────────────────────────────────────────────────────────────

/// Ordered, duplicate-free set of destination nodes.
///
/// Every successful mutation bumps the generation; a [`NextHopMap`] is only
/// valid for the generation it was computed against.
#[derive(Clone, Debug, Default)]
pub struct TargetSet {
    targets:    Vec<NodeId>,
    generation: u64,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node`; returns `false` if it was already a target.
    pub fn add(&mut self, node: NodeId) -> bool {
        if self.targets.contains(&node) {
            return false;
        }
        self.targets.push(node);
        self.generation += 1;
        true
    }

    /// Remove `node`; returns `false` if it was not a target.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(i) = self.targets.iter().position(|&t| t == node) else {
            return false;
        };
        self.targets.remove(i);
        self.generation += 1;
        true
    }

    pub fn clear(&mut self) {
        if !self.targets.is_empty() {
            self.targets.clear();
            self.generation += 1;
        }
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.targets.contains(&node)
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
