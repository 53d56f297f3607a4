use netscope_core::{
    DataIntegrityError, EdgeEndpoint, GraphEdge, GraphError, GraphNode, NodeDetails, NodeId,
    RawGraph, WeightInfo,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeIndex(pub usize);

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator counts for a loaded model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub op_types: BTreeMap<String, usize>,
}

/// Validated computation graph for one loaded model.
///
/// Nodes keep the order they were supplied in and edges keep input order;
/// both orders feed straight into layout and rendering.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    endpoints: Vec<(NodeIndex, NodeIndex)>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and index a node/edge set.
    ///
    /// Fails on the first duplicate node id or the first edge whose endpoint
    /// is not among `nodes`.
    pub fn build<N, E>(nodes: N, edges: E) -> Result<Self, DataIntegrityError>
    where
        N: IntoIterator<Item = GraphNode>,
        E: IntoIterator<Item = GraphEdge>,
    {
        let mut model = Self::new();

        for node in nodes {
            if model.node_map.contains_key(&node.id) {
                return Err(DataIntegrityError::DuplicateId(node.id));
            }
            let idx = NodeIndex(model.nodes.len());
            model.node_map.insert(node.id.clone(), idx);
            model.nodes.push(node);
        }

        for (edge_index, edge) in edges.into_iter().enumerate() {
            let source = model.lookup(&edge.source, edge_index, EdgeEndpoint::Source)?;
            let target = model.lookup(&edge.target, edge_index, EdgeEndpoint::Target)?;
            model.endpoints.push((source, target));
            model.edges.push(edge);
        }

        tracing::debug!(
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            "built graph model"
        );
        Ok(model)
    }

    pub fn from_payload(raw: RawGraph) -> Result<Self, GraphError> {
        let nodes = raw.nodes.into_iter().map(GraphNode::from);
        let edges = raw.edges.into_iter().map(GraphEdge::from);
        Ok(Self::build(nodes, edges)?)
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_payload(RawGraph::from_json(json)?)
    }

    fn lookup(
        &self,
        id: &NodeId,
        edge_index: usize,
        endpoint: EdgeEndpoint,
    ) -> Result<NodeIndex, DataIntegrityError> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| DataIntegrityError::DanglingEdgeReference {
                edge_index,
                endpoint,
                node: id.clone(),
            })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> {
        (0..self.edges.len()).map(EdgeIndex)
    }

    pub fn edge_endpoints(&self, index: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.endpoints.get(index.0).copied()
    }

    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_index(id).map(|idx| &self.nodes[idx.0])
    }

    pub fn summary(&self) -> GraphSummary {
        let mut op_types = BTreeMap::new();
        for node in &self.nodes {
            *op_types.entry(node.op_type.clone()).or_insert(0) += 1;
        }
        GraphSummary {
            num_nodes: self.nodes.len(),
            num_edges: self.edges.len(),
            op_types,
        }
    }

    /// Detail payload for a selected node. `weights` is the model's
    /// initializer table; only entries consumed by the node are attached.
    pub fn node_details(
        &self,
        id: &NodeId,
        weights: &BTreeMap<String, WeightInfo>,
    ) -> Result<NodeDetails, GraphError> {
        let node = self
            .get_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

        let node_weights = node
            .inputs
            .iter()
            .filter_map(|input| weights.get(input).map(|w| (input.clone(), w.clone())))
            .collect();

        Ok(NodeDetails {
            name: node.label.clone(),
            op_type: node.op_type.clone(),
            inputs: node.inputs.clone(),
            outputs: node.outputs.clone(),
            attributes: node.attributes.clone(),
            weights: node_weights,
        })
    }
}

impl Index<NodeIndex> for GraphModel {
    type Output = GraphNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl Index<EdgeIndex> for GraphModel {
    type Output = GraphEdge;
    fn index(&self, index: EdgeIndex) -> &Self::Output {
        &self.edges[index.0]
    }
}
