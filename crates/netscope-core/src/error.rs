use crate::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed graph input. Fatal to a load: nothing is rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataIntegrityError {
    #[error("edge {edge_index} references unknown {endpoint} node '{node}'")]
    DanglingEdgeReference {
        edge_index: usize,
        endpoint: EdgeEndpoint,
        node: NodeId,
    },
    #[error("duplicate node id '{0}'")]
    DuplicateId(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeEndpoint {
    Source,
    Target,
}

impl std::fmt::Display for EdgeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Target => write!(f, "target"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("failed to load graph: {0}")]
    DataIntegrity(#[from] DataIntegrityError),
    #[error("failed to load graph: invalid payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("node '{0}' not found")]
    NodeNotFound(NodeId),
    #[error("invalid layout direction: {0}")]
    InvalidDirection(String),
}

/// A graph with zero nodes. Rendered as an explicit empty state, never an error.
/// Serialized as its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EmptyGraphWarning;

impl EmptyGraphWarning {
    pub const MESSAGE: &'static str = "No nodes to display";
}

impl std::fmt::Display for EmptyGraphWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

impl From<EmptyGraphWarning> for String {
    fn from(value: EmptyGraphWarning) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EmptyGraphWarning {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == Self::MESSAGE {
            Ok(EmptyGraphWarning)
        } else {
            Err(format!("unknown warning '{value}'"))
        }
    }
}
