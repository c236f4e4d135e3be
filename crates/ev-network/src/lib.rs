//! `ev-network` — road network graph, next-hop routing, and network data.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                      |
//! |------------|---------------------------------------------------------------|
//! | [`graph`]  | `RoadGraph` (node arena, quantized key index, R-tree), `NodeKey` |
//! | [`paths`]  | `NextHopMap` (multi-target Dijkstra), `TargetSet`             |
//! | [`router`] | `Router` trait, `Route`, `AStarRouter`                        |
//! | [`source`] | `NetworkSource` trait, `NetworkData`, `CsvNetworkSource`      |
//! | [`build`]  | `build_road_graph` (polylines → pruned graph)                 |
//! | [`osm`]    | `OsmPbfSource` (feature = `"osm"` only)                       |
//! | [`error`]  | `GraphError`, `GraphResult<T>`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.              |
//! | `serde` | Derives `Serialize`/`Deserialize` on public data types.      |

pub mod build;
pub mod error;
pub mod graph;
pub mod paths;
pub mod router;
pub mod source;

#[cfg(feature = "osm")]
pub mod osm;

#[cfg(test)]
mod tests;

pub use build::build_road_graph;
pub use error::{GraphError, GraphResult};
pub use graph::{Node, NodeKey, RoadGraph};
pub use paths::{NextHopMap, TargetSet};
pub use router::{AStarRouter, Route, Router};
pub use source::{CsvNetworkSource, NetworkData, NetworkSource, RoadClass, RoadPolyline};

#[cfg(feature = "osm")]
pub use osm::OsmPbfSource;
