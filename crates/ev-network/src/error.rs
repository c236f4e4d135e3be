//! Network-subsystem error type.

use thiserror::Error;

use ev_core::NodeId;

/// Errors produced by `ev-network`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node position ({x}, {y}, {z}) is not finite")]
    NonFinitePosition { x: f32, y: f32, z: f32 },

    #[error("invalid weight {weight} on edge {from} -> {to}")]
    InvalidWeight { from: NodeId, to: NodeId, weight: f32 },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("no navigable roads in the study area")]
    EmptyNetwork,

    #[error("network source error: {0}")]
    Source(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type GraphResult<T> = Result<T, GraphError>;
