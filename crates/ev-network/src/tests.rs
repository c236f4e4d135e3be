//! Unit tests for ev-network.
//!
//! All tests use hand-built graphs and in-memory CSV so they run without
//! any external data.

#[cfg(test)]
mod helpers {
    use ev_core::{NodeId, Vec3};
    use crate::RoadGraph;

    /// Four nodes on a unit square:
    ///
    /// ```text
    ///   C(0,1) ── D(1,1)
    ///    │         │
    ///   A(0,0) ── B(1,0)
    /// ```
    ///
    /// Bidirectional weights: A-B 1, A-C 2, B-D 1, C-D 1.
    pub fn diamond() -> (RoadGraph, [NodeId; 4]) {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let b = g.add_node(Vec3::new(1.0, 0.0, 0.0)).unwrap();
        let c = g.add_node(Vec3::new(0.0, 0.0, 1.0)).unwrap();
        let d = g.add_node(Vec3::new(1.0, 0.0, 1.0)).unwrap();
        g.add_road(a, b, 1.0).unwrap();
        g.add_road(a, c, 2.0).unwrap();
        g.add_road(b, d, 1.0).unwrap();
        g.add_road(c, d, 1.0).unwrap();
        (g, [a, b, c, d])
    }

    /// Nodes along the x axis joined in sequence with the given weights.
    pub fn line(weights: &[f32]) -> (RoadGraph, Vec<NodeId>) {
        let mut g = RoadGraph::new();
        let mut ids = vec![g.add_node(Vec3::ZERO).unwrap()];
        let mut x = 0.0;
        for &w in weights {
            x += w;
            let id = g.add_node(Vec3::new(x, 0.0, 0.0)).unwrap();
            g.add_road(*ids.last().unwrap(), id, w).unwrap();
            ids.push(id);
        }
        (g, ids)
    }

    /// `n × n` lattice with uneven but deterministic weights.
    pub fn lattice(n: usize) -> (RoadGraph, Vec<NodeId>) {
        let mut g = RoadGraph::new();
        let mut ids = Vec::with_capacity(n * n);
        for row in 0..n {
            for col in 0..n {
                ids.push(g.add_node(Vec3::new(col as f32 * 10.0, 0.0, row as f32 * 10.0)).unwrap());
            }
        }
        for row in 0..n {
            for col in 0..n {
                let i = row * n + col;
                let w = 10.0 + ((row * 7 + col * 3) % 5) as f32;
                if col + 1 < n {
                    g.add_road(ids[i], ids[i + 1], w).unwrap();
                }
                if row + 1 < n {
                    g.add_road(ids[i], ids[i + n], w + 1.0).unwrap();
                }
            }
        }
        (g, ids)
    }
}

// ── Graph structure ────────────────────────────────────────────────────────────

#[cfg(test)]
mod graph {
    use ev_core::{NodeId, Vec2, Vec3};
    use crate::{GraphError, NodeKey, RoadGraph};

    #[test]
    fn add_node_is_idempotent_by_key() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let b = g.add_node(Vec3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn quantization_boundaries() {
        // 0.125 is exact in f32: 12.5 cm rounds away from zero.
        assert_eq!(NodeKey::from_position(Vec3::new(0.125, 0.0, 0.0)), Some(NodeKey(13, 0, 0)));
        assert_eq!(NodeKey::from_position(Vec3::new(-0.125, 0.0, 0.0)), Some(NodeKey(-13, 0, 0)));
        // Sub-centimetre differences collapse onto one node.
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::new(0.12, 5.0, 0.0)).unwrap();
        let b = g.add_node(Vec3::new(0.1249, 5.0, 0.0)).unwrap();
        let c = g.add_node(Vec3::new(0.125, 5.0, 0.0)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn non_finite_position_rejected() {
        let mut g = RoadGraph::new();
        let err = g.add_node(Vec3::new(f32::NAN, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, GraphError::NonFinitePosition { .. }));
        assert!(g.is_empty());
    }

    #[test]
    fn add_edge_validates_and_overwrites() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::ZERO).unwrap();
        let b = g.add_node(Vec3::X).unwrap();
        assert!(matches!(g.add_edge(a, b, -1.0), Err(GraphError::InvalidWeight { .. })));
        assert!(matches!(g.add_edge(a, b, f32::NAN), Err(GraphError::InvalidWeight { .. })));
        assert!(matches!(g.add_edge(a, NodeId(9), 1.0), Err(GraphError::NodeNotFound(_))));

        g.add_edge(a, b, 4.0).unwrap();
        g.add_edge(a, b, 2.5).unwrap();
        assert_eq!(g.edge_weight(a, b), Some(2.5));
        assert_eq!(g.edge_weight(b, a), None, "edges are directed");
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn remove_node_purges_all_references() {
        let (mut g, [a, b, c, d]) = super::helpers::diamond();
        g.remove_node(b).unwrap();

        assert!(!g.contains(b));
        assert_eq!(g.node_count(), 3);
        for (from, to, _) in g.edges() {
            assert_ne!(from, b);
            assert_ne!(to, b, "dangling edge {from} -> {to}");
        }
        assert_eq!(g.edge_weight(a, c), Some(2.0));
        assert_eq!(g.edge_weight(d, c), Some(1.0));
        assert!(g.find_node(Vec3::new(1.0, 0.0, 0.0)).is_none());
        assert!(matches!(g.remove_node(b), Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn ids_stay_stable_after_removal() {
        let (mut g, [a, b, _, d]) = super::helpers::diamond();
        g.remove_node(a).unwrap();
        assert_eq!(g.position(d), Some(Vec3::new(1.0, 0.0, 1.0)));
        let e = g.add_node(Vec3::new(5.0, 0.0, 5.0)).unwrap();
        assert_eq!(e, NodeId(4));
        assert_eq!(g.capacity(), 5);
        assert!(g.contains(b));
    }

    #[test]
    fn nearest_node_tracks_removals() {
        let (mut g, [a, b, ..]) = super::helpers::diamond();
        assert_eq!(g.nearest_node(Vec2::new(0.9, -0.2)), Some(b));
        g.remove_node(b).unwrap();
        assert_ne!(g.nearest_node(Vec2::new(0.9, -0.2)), Some(b));
        assert_eq!(g.nearest_node(Vec2::new(-3.0, -3.0)), Some(a));
    }

    #[test]
    fn components_and_pruning() {
        let (mut g, _) = super::helpers::diamond();
        let x = g.add_node(Vec3::new(50.0, 0.0, 50.0)).unwrap();
        let y = g.add_node(Vec3::new(51.0, 0.0, 50.0)).unwrap();
        g.add_road(x, y, 1.0).unwrap();
        let z = g.add_node(Vec3::new(90.0, 0.0, 90.0)).unwrap();

        let comps = g.connected_components();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].len(), 4);

        let removed = g.prune_to_largest();
        assert_eq!(removed, 3);
        assert_eq!(g.connected_components().len(), 1);
        assert!(!g.contains(z));
    }

    #[test]
    fn one_way_edges_join_components() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::ZERO).unwrap();
        let b = g.add_node(Vec3::X).unwrap();
        let c = g.add_node(Vec3::Z).unwrap();
        g.add_edge(a, b, 1.0).unwrap();
        g.add_edge(c, b, 1.0).unwrap();
        assert_eq!(g.connected_components().len(), 1);
    }

    #[test]
    fn prune_ties_keep_first_component() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::ZERO).unwrap();
        let b = g.add_node(Vec3::X).unwrap();
        let c = g.add_node(Vec3::new(10.0, 0.0, 0.0)).unwrap();
        let d = g.add_node(Vec3::new(11.0, 0.0, 0.0)).unwrap();
        g.add_road(a, b, 1.0).unwrap();
        g.add_road(c, d, 1.0).unwrap();
        g.prune_to_largest();
        assert!(g.contains(a) && g.contains(b));
        assert!(!g.contains(c) && !g.contains(d));
    }
}

// ── Next-hop computation ───────────────────────────────────────────────────────

#[cfg(test)]
mod next_hops {
    use ev_core::{NodeId, Vec3};
    use crate::{RoadGraph, TargetSet};

    #[test]
    fn diamond_routes_via_cheapest_branch() {
        let (g, [a, b, c, d]) = super::helpers::diamond();
        let map = g.compute_shortest_path(&[d]);

        assert_eq!(map.next_hop(a), Some(b));
        assert_eq!(map.next_hop(b), Some(d));
        assert_eq!(map.next_hop(c), Some(d));
        assert_eq!(map.next_hop(d), None);
        assert!(map.is_target(d));
        assert_eq!(map.distance(a), Some(2.0));
        assert_eq!(map.path_from(a), Some(vec![a, b, d]));
    }

    #[test]
    fn adding_a_target_reroutes_only_nearer_nodes() {
        // A -1- B -1- C -1.5- D -1- E
        let (g, ids) = super::helpers::line(&[1.0, 1.0, 1.5, 1.0]);
        let (a, b, c, d, e) = (ids[0], ids[1], ids[2], ids[3], ids[4]);

        let mut targets = TargetSet::new();
        targets.add(a);
        let before = g.compute_shortest_path(targets.as_slice());
        assert_eq!(before.next_hop(d), Some(c));

        targets.add(e);
        let after = g.compute_shortest_path(targets.as_slice());
        assert_eq!(after.next_hop(d), Some(e), "E is now nearer to D");
        assert_eq!(after.next_hop(c), before.next_hop(c));
        assert_eq!(after.next_hop(b), before.next_hop(b));
        assert_eq!(after.next_hop(b), Some(a));
    }

    #[test]
    fn hop_chains_reach_a_target_without_cycles() {
        let (g, ids) = super::helpers::lattice(6);
        let targets = [ids[0], ids[35]];
        let map = g.compute_shortest_path(&targets);

        for &start in &ids {
            let path = map.path_from(start).expect("lattice is connected");
            assert!(path.len() <= g.node_count());
            assert!(targets.contains(path.last().unwrap()));

            let mut seen = std::collections::HashSet::new();
            assert!(path.iter().all(|n| seen.insert(*n)), "cycle from {start}");
        }
    }

    #[test]
    fn distances_are_consistent_with_hops() {
        let (g, ids) = super::helpers::lattice(5);
        let map = g.compute_shortest_path(&[ids[12]]);
        for &n in &ids {
            if let Some(hop) = map.next_hop(n) {
                let w = g.edge_weight(n, hop).unwrap();
                let expected = w + map.distance(hop).unwrap();
                assert!((map.distance(n).unwrap() - expected).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn unreachable_and_unknown_nodes_have_no_hop() {
        let mut g = RoadGraph::new();
        let t = g.add_node(Vec3::ZERO).unwrap();
        let x = g.add_node(Vec3::X).unwrap();
        // One-way away from the target: x cannot reach t.
        g.add_edge(t, x, 1.0).unwrap();
        let map = g.compute_shortest_path(&[t]);

        assert!(map.knows(x));
        assert_eq!(map.next_hop(x), None);
        assert_eq!(map.distance(x), None);
        assert_eq!(map.path_from(x), None);
        assert!(!map.knows(NodeId(77)));
    }

    #[test]
    fn dead_targets_are_skipped() {
        let (mut g, [a, b, _, d]) = super::helpers::diamond();
        g.remove_node(d).unwrap();
        let map = g.compute_shortest_path(&[d, b]);
        assert_eq!(map.targets(), &[b]);
        assert_eq!(map.next_hop(a), Some(b));
    }

    #[test]
    fn empty_target_set_routes_nowhere() {
        let (g, ids) = super::helpers::diamond();
        let map = g.compute_shortest_path(&[]);
        assert!(ids.iter().all(|&n| map.next_hop(n).is_none()));
        assert!(map.knows(ids[0]));
    }

    #[test]
    fn target_set_generation() {
        let mut t = TargetSet::new();
        assert!(t.add(NodeId(3)));
        assert!(!t.add(NodeId(3)));
        assert_eq!(t.generation(), 1);
        assert!(t.add(NodeId(1)));
        assert_eq!(t.as_slice(), &[NodeId(3), NodeId(1)]);
        assert!(t.remove(NodeId(3)));
        assert!(!t.remove(NodeId(3)));
        assert_eq!(t.generation(), 3);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.generation(), 4);
    }

    #[test]
    fn generation_tag() {
        let (g, [.., d]) = super::helpers::diamond();
        let map = g.compute_shortest_path(&[d]).with_generation(9);
        assert_eq!(map.generation(), 9);
    }
}

// ── A* ────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod a_star {
    use ev_core::{NodeId, Vec3};
    use crate::{AStarRouter, GraphError, RoadGraph, Router};

    #[test]
    fn diamond_shortest_route() {
        let (g, [a, b, _, d]) = super::helpers::diamond();
        let route = AStarRouter.route(&g, a, d).unwrap();
        assert_eq!(route.nodes, vec![a, b, d]);
        assert_eq!(route.total_cost, 2.0);
    }

    #[test]
    fn matches_next_hop_distances_on_lattice() {
        let (g, ids) = super::helpers::lattice(5);
        let goal = ids[24];
        let map = g.compute_shortest_path(&[goal]);
        for &start in &ids {
            let route = g.a_star(start, goal).unwrap();
            assert!((route.total_cost - map.distance(start).unwrap()).abs() < 1e-3);
            assert_eq!(route.nodes.first(), Some(&start));
            assert_eq!(route.nodes.last(), Some(&goal));
        }
    }

    #[test]
    fn deterministic_across_runs() {
        let (g, ids) = super::helpers::lattice(4);
        let first = g.a_star(ids[0], ids[15]).unwrap();
        for _ in 0..5 {
            assert_eq!(g.a_star(ids[0], ids[15]).unwrap(), first);
        }
    }

    #[test]
    fn trivial_route() {
        let (g, [a, ..]) = super::helpers::diamond();
        let r = g.a_star(a, a).unwrap();
        assert!(r.is_trivial());
        assert_eq!(r.total_cost, 0.0);
    }

    #[test]
    fn unreachable_goal_is_no_route() {
        let mut g = RoadGraph::new();
        let a = g.add_node(Vec3::ZERO).unwrap();
        let b = g.add_node(Vec3::X).unwrap();
        g.add_edge(b, a, 1.0).unwrap();
        assert!(matches!(g.a_star(a, b), Err(GraphError::NoRoute { .. })));
        assert!(matches!(g.a_star(a, NodeId(5)), Err(GraphError::NodeNotFound(_))));
    }
}

// ── Sources and graph construction ─────────────────────────────────────────────

#[cfg(test)]
mod source {
    use std::io::Cursor;

    use ev_core::{ElevationSampler, GeoBounds, GeoPoint, GridSample, LocalProjection};
    use crate::source::{read_buildings, read_roads};
    use crate::{
        build_road_graph, CsvNetworkSource, GraphError, NetworkData, NetworkSource, RoadClass,
        RoadPolyline,
    };

    struct Flat(f32);

    impl ElevationSampler for Flat {
        fn height(&self, _p: GeoPoint) -> GridSample<f32> {
            GridSample::Inside(self.0)
        }
    }

    struct NoCoverage;

    impl ElevationSampler for NoCoverage {
        fn height(&self, _p: GeoPoint) -> GridSample<f32> {
            GridSample::OutOfBounds { fallback: 3.0 }
        }
    }

    fn bounds() -> GeoBounds {
        GeoBounds::new(6.60, 46.50, 6.65, 46.53).unwrap()
    }

    fn road(class: RoadClass, pts: &[(f64, f64)]) -> RoadPolyline {
        RoadPolyline { class, points: pts.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect() }
    }

    #[test]
    fn road_class_parsing() {
        assert_eq!(RoadClass::from_highway("primary_link"), Some(RoadClass::Primary));
        assert_eq!(RoadClass::from_highway("residential"), Some(RoadClass::Residential));
        assert_eq!(RoadClass::from_highway("footway"), None);
        assert_eq!(RoadClass::Service.to_string(), "service");
    }

    #[test]
    fn csv_roads_grouped_sorted_and_filtered() {
        let csv = "road_id,seq,lat,lon,class\n\
                   2,1,46.511,6.621,residential\n\
                   1,0,46.510,6.620,primary\n\
                   2,0,46.510,6.620,residential\n\
                   1,1,46.512,6.622,primary\n\
                   3,0,46.510,6.620,footway\n\
                   3,1,46.511,6.621,footway\n\
                   4,0,46.515,6.625,service\n";
        let roads = read_roads(Cursor::new(csv)).unwrap();
        assert_eq!(roads.len(), 2, "footway dropped, single-vertex road dropped");
        assert_eq!(roads[0].class, RoadClass::Primary);
        assert_eq!(roads[1].points[0], GeoPoint::new(46.510, 6.620));
        assert_eq!(roads[1].points[1], GeoPoint::new(46.511, 6.621));
    }

    #[test]
    fn csv_parse_error_surfaces() {
        let csv = "road_id,seq,lat,lon,class\nx,0,46.5,6.6,primary\n";
        assert!(matches!(read_roads(Cursor::new(csv)), Err(GraphError::Source(_))));
    }

    #[test]
    fn csv_buildings() {
        let csv = "lat,lon\n46.51,6.62\n46.52,6.63\n";
        assert_eq!(read_buildings(Cursor::new(csv)).unwrap().len(), 2);
    }

    #[test]
    fn missing_csv_file_is_an_error_not_empty_data() {
        let src = CsvNetworkSource::new("/nonexistent/roads.csv");
        assert!(matches!(src.fetch(&bounds()), Err(GraphError::Io(_))));
    }

    #[test]
    fn build_merges_shared_vertices_and_prunes_islands() {
        let data = NetworkData {
            roads: vec![
                road(RoadClass::Primary, &[(46.510, 6.620), (46.511, 6.620), (46.512, 6.620)]),
                road(RoadClass::Residential, &[(46.511, 6.620), (46.511, 6.621)]),
                // Island far from the rest.
                road(RoadClass::Service, &[(46.525, 6.645), (46.525, 6.646)]),
            ],
            buildings: vec![],
        };
        let b = bounds();
        let graph = build_road_graph(&data, &LocalProjection::new(&b), &Flat(2.0)).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 6);
        assert_eq!(graph.connected_components().len(), 1);
        assert!(graph.node_ids().all(|n| graph.position(n).unwrap().y == 2.0));
        // Weights are segment lengths: ~111 m per millidegree of latitude.
        let (from, to, w) = graph.edges().next().unwrap();
        let d = graph.position(from).unwrap().distance(graph.position(to).unwrap());
        assert!((w - d).abs() < 1e-3);
        assert!(w > 100.0 && w < 120.0, "got {w}");
    }

    #[test]
    fn out_of_bounds_heights_use_fallback() {
        let data = NetworkData {
            roads: vec![road(RoadClass::Primary, &[(46.510, 6.620), (46.511, 6.620)])],
            buildings: vec![],
        };
        let b = bounds();
        let graph = build_road_graph(&data, &LocalProjection::new(&b), &NoCoverage).unwrap();
        assert!(graph.node_ids().all(|n| graph.position(n).unwrap().y == 3.0));
    }

    #[test]
    fn empty_network_is_an_error() {
        let b = bounds();
        let err = build_road_graph(&NetworkData::default(), &LocalProjection::new(&b), &Flat(0.0));
        assert!(matches!(err, Err(GraphError::EmptyNetwork)));
    }

    #[test]
    fn preloaded_data_is_a_source() {
        let data = NetworkData {
            roads: vec![road(RoadClass::Primary, &[(46.510, 6.620), (46.511, 6.620)])],
            buildings: vec![GeoPoint::new(46.51, 6.62)],
        };
        assert_eq!(data.fetch(&bounds()).unwrap(), data);
        assert_eq!(data.segment_count(), 1);
    }
}
