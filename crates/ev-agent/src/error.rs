use ev_core::CoreError;
use ev_network::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("cannot place agents on an empty road graph")]
    EmptyGraph,

    #[error("{0} agents exceed the AgentId range")]
    TooManyAgents(usize),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type AgentResult<T> = Result<T, AgentError>;
