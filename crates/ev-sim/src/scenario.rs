//! End-to-end setup: network source + elevation → graph, flood field, agents.

use ev_agent::{Population, PopulationBuilder, SpawnDensity};
use ev_core::{ElevationSampler, GeoBounds, LocalProjection, SimConfig};
use ev_flood::{FloodField, TerrainGrid};
use ev_network::{build_road_graph, NetworkSource, RoadGraph};
use log::info;

use crate::{SimBuilder, SimError, SimResult};

/// Everything a [`Sim`](crate::Sim) needs, assembled from external data.
pub struct Scenario {
    pub config:     SimConfig,
    pub bounds:     GeoBounds,
    pub projection: LocalProjection,
    pub graph:      RoadGraph,
    pub flood:      FloodField,
    pub population: Population,
    /// Building centroids that fell inside the bounds.
    pub buildings:  u32,
}

impl Scenario {
    /// Run the setup pipeline.
    ///
    /// Source failures propagate.  A network with no drivable roads, or one
    /// that yields no agents, is an error rather than an empty simulation.
    pub fn load<S, E>(config: SimConfig, bounds: GeoBounds, source: &S, elevation: &E) -> SimResult<Self>
    where
        S: NetworkSource + ?Sized,
        E: ElevationSampler + ?Sized,
    {
        config.validate()?;
        let projection = LocalProjection::new(&bounds);

        let data = source.fetch(&bounds)?;
        info!(
            "fetched {} roads ({} segments) and {} buildings",
            data.roads.len(),
            data.segment_count(),
            data.buildings.len()
        );

        let graph = build_road_graph(&data, &projection, elevation)?;
        let terrain = TerrainGrid::sample_from(elevation, &projection, &bounds, config.terrain_resolution)?;
        let flood = FloodField::new(terrain, config.flood.clone());

        let density = SpawnDensity::new(bounds, config.spawn_grid, &data.buildings)?;
        let population = PopulationBuilder::new(config.agent_count, config.seed)
            .agent_params(config.agents.clone())
            .collision(config.collision.clone())
            .build(&graph, &density, &projection, elevation)?;
        if population.is_empty() {
            return Err(SimError::NoAgentsSpawned);
        }

        Ok(Scenario {
            buildings: density.total_buildings(),
            config,
            bounds,
            projection,
            graph,
            flood,
            population,
        })
    }

    /// Hand the assembled parts to a [`SimBuilder`].
    pub fn into_builder(self) -> SimBuilder {
        SimBuilder::new(self.config, self.graph, self.flood, self.population)
    }
}
