//! Wire shapes exchanged with the host application.
//!
//! The raw graph payload is what a model loader hands over before anything is
//! validated; [`NodeDetails`] is the per-node payload shown on selection.

use crate::{AttributeValue, GraphEdge, GraphError, GraphNode, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

impl RawGraph {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, GraphError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub op_type: String,
    #[serde(default)]
    pub data: RawNodeData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNodeData {
    #[serde(default)]
    pub input: Vec<String>,
    #[serde(default)]
    pub output: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl From<RawNode> for GraphNode {
    fn from(raw: RawNode) -> Self {
        let label = if raw.label.is_empty() {
            raw.id.clone()
        } else {
            raw.label
        };
        GraphNode {
            id: NodeId(raw.id),
            label,
            op_type: raw.op_type,
            inputs: raw.data.input,
            outputs: raw.data.output,
            attributes: raw.data.attributes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: Option<RawEdgeData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEdgeData {
    #[serde(default)]
    pub tensor_name: String,
}

impl From<RawEdge> for GraphEdge {
    fn from(raw: RawEdge) -> Self {
        GraphEdge {
            source: NodeId(raw.source),
            target: NodeId(raw.target),
            tensor_name: raw.data.map(|d| d.tensor_name).unwrap_or_default(),
        }
    }
}

/// Shape and storage of an initializer tensor feeding a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightInfo {
    pub dims: Vec<i64>,
    pub data_type: i32,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetails {
    pub name: String,
    pub op_type: String,
    #[serde(rename = "input")]
    pub inputs: Vec<String>,
    #[serde(rename = "output")]
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub weights: BTreeMap<String, WeightInfo>,
}
