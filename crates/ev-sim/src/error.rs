use ev_agent::AgentError;
use ev_core::{CoreError, NodeId};
use ev_flood::FloodError;
use ev_network::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("no agents could be spawned; the area has no navigable roads")]
    NoAgentsSpawned,

    #[error("target {0} is not a node of the road graph")]
    UnknownTarget(NodeId),

    #[error("time multiplier must be finite and non-negative, got {0}")]
    InvalidTimeMultiplier(f32),

    #[error("route worker failed: {0}")]
    RouteWorker(String),

    #[error("road network error: {0}")]
    Graph(#[from] GraphError),

    #[error("flood field error: {0}")]
    Flood(#[from] FloodError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}

pub type SimResult<T> = Result<T, SimError>;
