//! Integration tests for ev-sim.

use std::time::Duration;

use ev_agent::{Population, PopulationBuilder, PopulationCounts};
use ev_core::{AgentParams, FloodParams, NodeId, SimConfig, Tick, ValueRange, Vec2, Vec3};
use ev_flood::{FloodField, GridDims, GridGeometry, TerrainGrid};
use ev_network::RoadGraph;

use crate::{RouteMode, SimBuilder, SimObserver, TickSummary};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config() -> SimConfig {
    SimConfig {
        agents: AgentParams {
            walk_speed:     ValueRange::fixed(2.0),
            drive_speed:    ValueRange::fixed(10.0),
            reaction_time:  ValueRange::fixed(0.0),
            spawn_jitter_m: 0.0,
        },
        output_interval_ticks: 2,
        ..SimConfig::default()
    }
}

/// Five nodes 50 m apart along x: 0 ↔ 1 ↔ 2 ↔ 3 ↔ 4.
fn line_graph() -> (RoadGraph, Vec<NodeId>) {
    let mut g = RoadGraph::new();
    let ids: Vec<NodeId> = (0..5)
        .map(|i| g.add_node(Vec3::new(i as f32 * 50.0, 0.0, 0.0)).unwrap())
        .collect();
    for w in ids.windows(2) {
        g.add_road(w[0], w[1], 50.0).unwrap();
    }
    (g, ids)
}

fn dry_flood() -> FloodField {
    let dims = GridDims::new(4, 4).unwrap();
    let geom = GridGeometry::new(Vec2::splat(-1000.0), Vec2::splat(1000.0)).unwrap();
    let terrain = TerrainGrid::from_heights(dims, geom, vec![0.0; 16]).unwrap();
    FloodField::new(terrain, FloodParams::default())
}

/// One agent standing on each of the given nodes.
fn agents_on(g: &RoadGraph, nodes: &[NodeId], config: &SimConfig) -> Population {
    let positions: Vec<Vec3> = nodes.iter().map(|&n| g.position(n).unwrap()).collect();
    PopulationBuilder::new(positions.len(), config.seed)
        .agent_params(config.agents.clone())
        .collision(config.collision.clone())
        .build_at(g, &positions)
        .unwrap()
}

fn blocking_sim(targets: Vec<NodeId>) -> (crate::Sim, Vec<NodeId>) {
    let config = test_config();
    let (g, ids) = line_graph();
    let pop = agents_on(&g, &ids[..2], &config);
    let sim = SimBuilder::new(config, g, dry_flood(), pop)
        .targets(targets)
        .route_mode(RouteMode::Blocking)
        .build()
        .unwrap();
    (sim, ids)
}

#[derive(Default)]
struct Recorder {
    starts:    u64,
    ends:      Vec<TickSummary>,
    snapshots: Vec<Tick>,
    installed: Vec<u64>,
    finished:  Option<PopulationCounts>,
}

impl SimObserver for Recorder {
    fn on_tick_start(&mut self, _tick: Tick) {
        self.starts += 1;
    }
    fn on_tick_end(&mut self, summary: &TickSummary) {
        self.ends.push(summary.clone());
    }
    fn on_snapshot(&mut self, tick: Tick, agents: &[ev_agent::Agent], _flood: &FloodField) {
        assert_eq!(agents.len(), 2);
        self.snapshots.push(tick);
    }
    fn on_routes_installed(&mut self, generation: u64, _targets: &[NodeId]) {
        self.installed.push(generation);
    }
    fn on_sim_end(&mut self, _final_tick: Tick, counts: &PopulationCounts) {
        self.finished = Some(counts.clone());
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::SimError;

    #[test]
    fn builds_paused() {
        let (sim, ids) = blocking_sim(vec![]);
        assert!(!sim.is_running());
        assert_eq!(sim.population().len(), 2);
        assert!(sim.targets().is_empty());
        assert!(sim.next_hops().is_none());
        assert_eq!(sim.graph().node_count(), ids.len());
    }

    #[test]
    fn empty_population_rejected() {
        let config = test_config();
        let (g, _) = line_graph();
        let pop = agents_on(&g, &[], &config);
        let result = SimBuilder::new(config, g, dry_flood(), pop).build();
        assert!(matches!(result, Err(SimError::NoAgentsSpawned)));
    }

    #[test]
    fn unknown_target_rejected() {
        let config = test_config();
        let (g, ids) = line_graph();
        let pop = agents_on(&g, &ids[..1], &config);
        let result = SimBuilder::new(config, g, dry_flood(), pop).targets(vec![NodeId(99)]).build();
        assert!(matches!(result, Err(SimError::UnknownTarget(NodeId(99)))));
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = test_config();
        config.collision.stop_distance = 20.0;
        let (g, ids) = line_graph();
        let pop = agents_on(&g, &ids[..1], &config);
        let result = SimBuilder::new(config, g, dry_flood(), pop).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn initial_targets_routed_in_blocking_mode() {
        let (sim, ids) = blocking_sim(vec![NodeId(4)]);
        assert!(sim.routes_current());
        assert_eq!(sim.next_hops().unwrap().next_hop(ids[0]), Some(ids[1]));
    }
}

// ── Time control ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod time_tests {
    use super::*;
    use crate::{NoopObserver, SimError};

    #[test]
    fn paused_tick_is_a_no_op() {
        let (mut sim, _) = blocking_sim(vec![]);
        assert!(!sim.tick(0.1, &mut NoopObserver));
        assert_eq!(sim.current_tick(), Tick(0));
        assert_eq!(sim.clock.elapsed_secs, 0.0);

        sim.start();
        assert!(sim.tick(0.1, &mut NoopObserver));
        sim.pause();
        assert!(!sim.tick(0.1, &mut NoopObserver));
        assert_eq!(sim.current_tick(), Tick(1));
    }

    #[test]
    fn long_frames_are_clamped() {
        let (mut sim, _) = blocking_sim(vec![]);
        sim.start();
        let mut rec = Recorder::default();
        sim.tick(5.0, &mut rec);
        let expected = sim.config.stall_frame_secs;
        assert!((rec.ends[0].dt - expected).abs() < 1e-6);
        assert!((sim.clock.elapsed_secs - expected as f64).abs() < 1e-6);
    }

    #[test]
    fn time_multiplier_scales_step() {
        let (mut sim, _) = blocking_sim(vec![]);
        sim.start();
        sim.set_time_multiplier(4.0).unwrap();
        sim.tick(0.25, &mut NoopObserver);
        assert!((sim.clock.elapsed_secs - 1.0).abs() < 1e-6);
        assert!(matches!(sim.set_time_multiplier(-1.0), Err(SimError::InvalidTimeMultiplier(_))));
        assert!(sim.set_time_multiplier(f32::NAN).is_err());
        assert_eq!(sim.time_multiplier(), 4.0);
    }
}

// ── Evacuation runs ───────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;
    use crate::NoopObserver;

    #[test]
    fn evacuation_settles_at_target() {
        let (mut sim, ids) = blocking_sim(vec![NodeId(4)]);
        sim.start();
        assert!(sim.run_until_settled(0.5, 1_000, &mut NoopObserver));
        let counts = sim.counts();
        assert_eq!(counts.arrived, 2);
        assert_eq!(counts.active, 0);
        assert_eq!(counts.per_target, vec![(ids[4], 2)]);
        // 200 m at 10 m/s in 0.5 s frames.
        assert!(sim.current_tick().0 <= 45, "took {}", sim.current_tick());
    }

    #[test]
    fn observer_hooks_fire() {
        let (mut sim, _) = blocking_sim(vec![NodeId(4)]);
        sim.start();
        let mut rec = Recorder::default();
        assert_eq!(sim.run_ticks(4, 0.5, &mut rec), 4);
        assert_eq!(rec.starts, 4);
        assert_eq!(rec.ends.len(), 4);
        assert_eq!(rec.snapshots, vec![Tick(0), Tick(2)]);
        assert!(rec.finished.is_some());
        assert!((rec.ends[3].sim_secs - 2.0).abs() < 1e-6);
        assert_eq!(rec.ends[3].counts.total, 2);
    }

    #[test]
    fn paused_run_stops_early() {
        let (mut sim, _) = blocking_sim(vec![NodeId(4)]);
        assert_eq!(sim.run_ticks(10, 0.5, &mut NoopObserver), 0);
        assert!(!sim.run_until_settled(0.5, 10, &mut NoopObserver));
    }

    #[test]
    fn flooded_agents_counted() {
        let (mut sim, _) = blocking_sim(vec![NodeId(4)]);
        let dims = sim.flood().dims();
        for i in 0..dims.cell_count() {
            sim.flood_mut().set_water(dims.coord(i), 2.0).unwrap();
        }
        sim.start();
        sim.tick(0.1, &mut NoopObserver);
        assert_eq!(sim.counts().flooded, 2);
        assert!(sim.population().agents().iter().all(|a| !a.is_driving));
    }
}

// ── Target mutation and route installation ────────────────────────────────────

#[cfg(test)]
mod target_tests {
    use super::*;
    use crate::{NoopObserver, SimError};

    #[test]
    fn add_and_remove_targets_blocking() {
        let (mut sim, ids) = blocking_sim(vec![]);
        assert!(sim.add_target(ids[4]).unwrap());
        assert!(!sim.add_target(ids[4]).unwrap());
        assert_eq!(sim.next_hops().unwrap().next_hop(ids[2]), Some(ids[3]));

        assert!(sim.add_target(ids[0]).unwrap());
        assert_eq!(sim.next_hops().unwrap().next_hop(ids[1]), Some(ids[0]));
        assert_eq!(sim.next_hops().unwrap().next_hop(ids[3]), Some(ids[4]));

        assert!(sim.remove_target(ids[0]).unwrap());
        assert!(!sim.remove_target(ids[0]).unwrap());
        assert_eq!(sim.next_hops().unwrap().next_hop(ids[1]), Some(ids[2]));
        assert!(sim.routes_current());
    }

    #[test]
    fn unknown_target_is_an_error() {
        let (mut sim, _) = blocking_sim(vec![]);
        assert!(matches!(sim.add_target(NodeId(42)), Err(SimError::UnknownTarget(_))));
    }

    #[test]
    fn agents_wait_until_routes_arrive() {
        let config = test_config();
        let (g, ids) = line_graph();
        let pop = agents_on(&g, &ids[..2], &config);
        let mut sim = SimBuilder::new(config, g, dry_flood(), pop)
            .route_mode(RouteMode::Background)
            .build()
            .unwrap();
        sim.start();
        sim.tick(0.1, &mut NoopObserver);
        assert_eq!(sim.counts().idle, 2);

        sim.add_target(ids[4]).unwrap();
        assert!(sim.wait_for_routes(Duration::from_secs(10)));
        sim.tick(0.1, &mut NoopObserver);
        assert_eq!(sim.counts().idle, 0);
        assert_eq!(sim.counts().active, 2);
    }

    #[test]
    fn stale_maps_are_discarded() {
        let config = test_config();
        let (g, ids) = line_graph();
        let pop = agents_on(&g, &ids[..2], &config);
        let mut sim = SimBuilder::new(config, g, dry_flood(), pop)
            .route_mode(RouteMode::Background)
            .build()
            .unwrap();

        sim.add_target(ids[4]).unwrap();
        sim.add_target(ids[0]).unwrap();
        assert!(sim.wait_for_routes(Duration::from_secs(10)));

        let map = sim.next_hops().unwrap();
        assert_eq!(map.generation(), sim.targets().generation());
        assert_eq!(map.targets().len(), 2);
    }

    #[test]
    fn background_installs_through_tick() {
        let config = test_config();
        let (g, ids) = line_graph();
        let pop = agents_on(&g, &ids[..2], &config);
        let mut sim = SimBuilder::new(config, g, dry_flood(), pop)
            .targets(vec![ids[4]])
            .build()
            .unwrap();
        assert_eq!(sim.route_mode(), RouteMode::Background);
        sim.start();

        let mut rec = Recorder::default();
        for _ in 0..1_000 {
            sim.tick(0.01, &mut rec);
            if sim.routes_current() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(sim.routes_current());
        assert_eq!(rec.installed, vec![sim.targets().generation()]);
    }
}

// ── Scenario setup ────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario_tests {
    use ev_core::{ElevationRaster, GeoBounds, GeoPoint, SimConfig};
    use ev_network::{GraphError, NetworkData, RoadClass, RoadPolyline};

    use crate::{Scenario, SimError};

    fn bounds() -> GeoBounds {
        GeoBounds::new(10.0, 50.0, 10.01, 50.01).unwrap()
    }

    fn flat() -> ElevationRaster {
        ElevationRaster::from_fn(bounds(), 4, 4, |_, _| 5.0).unwrap()
    }

    fn one_road() -> NetworkData {
        NetworkData {
            roads: vec![RoadPolyline {
                class:  RoadClass::Residential,
                points: (1..10).map(|i| GeoPoint::new(50.005, 10.0 + i as f64 * 0.001)).collect(),
            }],
            buildings: vec![GeoPoint::new(50.004, 10.002), GeoPoint::new(50.006, 10.007)],
        }
    }

    fn small_config(agents: usize) -> SimConfig {
        SimConfig { agent_count: agents, terrain_resolution: 8, spawn_grid: 4, ..SimConfig::default() }
    }

    #[test]
    fn loads_full_pipeline() {
        let s = Scenario::load(small_config(10), bounds(), &one_road(), &flat()).unwrap();
        assert_eq!(s.graph.node_count(), 9);
        assert_eq!(s.population.len(), 10);
        assert_eq!(s.buildings, 2);
        assert_eq!(s.flood.dims().cell_count(), 64);
        let sim = s.into_builder().build().unwrap();
        assert_eq!(sim.population().len(), 10);
    }

    #[test]
    fn no_roads_is_an_error() {
        let empty = NetworkData::default();
        let result = Scenario::load(small_config(10), bounds(), &empty, &flat());
        assert!(matches!(result, Err(SimError::Graph(GraphError::EmptyNetwork))));
    }

    #[test]
    fn zero_agents_reported() {
        let result = Scenario::load(small_config(0), bounds(), &one_road(), &flat());
        assert!(matches!(result, Err(SimError::NoAgentsSpawned)));
    }
}
