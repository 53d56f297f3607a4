use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod error;
pub mod payload;

pub use error::{DataIntegrityError, EdgeEndpoint, EmptyGraphWarning, GraphError};
pub use payload::{NodeDetails, RawEdge, RawEdgeData, RawGraph, RawNode, RawNodeData, WeightInfo};

/// Attribute values are carried through untouched from the model payload.
pub type AttributeValue = serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Positional edge id, written as `e{index}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EdgeId(pub usize);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<EdgeId> for String {
    fn from(value: EdgeId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for EdgeId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .strip_prefix('e')
            .and_then(|n| n.parse().ok())
            .map(EdgeId)
            .ok_or_else(|| format!("invalid edge id '{value}'"))
    }
}

/// An operator in the computation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub op_type: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, op_type: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id: NodeId(id),
            op_type: op_type.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }
}

/// A tensor flowing from the producing operator to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub tensor_name: String,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        tensor_name: impl Into<String>,
    ) -> Self {
        Self {
            source: NodeId(source.into()),
            target: NodeId(target.into()),
            tensor_name: tensor_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LayoutDirection {
    #[default]
    #[serde(alias = "TB")]
    TopToBottom,
    #[serde(alias = "LR")]
    LeftToRight,
}

impl LayoutDirection {
    pub fn is_horizontal(self) -> bool {
        matches!(self, LayoutDirection::LeftToRight)
    }

    pub fn toggled(self) -> Self {
        match self {
            LayoutDirection::TopToBottom => LayoutDirection::LeftToRight,
            LayoutDirection::LeftToRight => LayoutDirection::TopToBottom,
        }
    }

    /// Short code used by toolbars and the command line ("TB" / "LR").
    pub fn code(self) -> &'static str {
        match self {
            LayoutDirection::TopToBottom => "TB",
            LayoutDirection::LeftToRight => "LR",
        }
    }
}

impl std::str::FromStr for LayoutDirection {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tb" | "top-to-bottom" | "toptobottom" | "vertical" => Ok(Self::TopToBottom),
            "lr" | "left-to-right" | "lefttoright" | "horizontal" => Ok(Self::LeftToRight),
            other => Err(GraphError::InvalidDirection(other.to_string())),
        }
    }
}
