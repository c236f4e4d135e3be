//! Road graph construction from source polylines.

use ev_core::{ElevationSampler, LocalProjection};

use crate::{GraphError, GraphResult, NetworkData, RoadGraph};

/// Build the routable graph for a study area.
///
/// Every polyline vertex becomes a node at its projected position, lifted to
/// the sampled terrain height.  Consecutive vertices are joined in both
/// directions with their 3D length as weight.  The result is pruned to its
/// largest connected component.
///
/// Vertices outside the elevation raster use the clamped fallback height and
/// are reported once in aggregate.
///
/// # Errors
///
/// [`GraphError::EmptyNetwork`] if no nodes survive.
pub fn build_road_graph<E>(
    data: &NetworkData,
    projection: &LocalProjection,
    elevation: &E,
) -> GraphResult<RoadGraph>
where
    E: ElevationSampler + ?Sized,
{
    let mut graph = RoadGraph::new();
    let mut out_of_bounds = 0usize;

    for road in &data.roads {
        let mut prev = None;
        for &point in &road.points {
            let sample = elevation.height(point);
            if sample.is_out_of_bounds() {
                out_of_bounds += 1;
            }
            let id = graph.add_node(projection.project_with_height(point, sample.value()))?;

            if let Some(from) = prev.filter(|&from| from != id) {
                let (Some(a), Some(b)) = (graph.position(from), graph.position(id)) else {
                    return Err(GraphError::NodeNotFound(id));
                };
                graph.add_road(from, id, a.distance(b))?;
            }
            prev = Some(id);
        }
    }

    if out_of_bounds > 0 {
        log::warn!("{out_of_bounds} road vertices fell outside the elevation raster; clamped heights used");
    }

    let before = graph.node_count();
    graph.prune_to_largest();
    if graph.is_empty() {
        return Err(GraphError::EmptyNetwork);
    }
    log::info!(
        "road graph built: {} of {} nodes, {} directed edges from {} polylines",
        graph.node_count(),
        before,
        graph.edge_count(),
        data.roads.len()
    );
    Ok(graph)
}
