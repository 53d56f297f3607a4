//! Projection of a layout into what a drawing host consumes.

use crate::graph::GraphModel;
use crate::layout::{GraphLayout, LayoutNode};
use crate::style::{StyleDescriptor, StyleLookup};
use netscope_core::{EdgeId, NodeId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledNode {
    #[serde(flatten)]
    pub layout: LayoutNode,
    pub style: StyleDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub animated: bool,
}

/// Attach a style to every laid-out node. Output follows layout node order.
pub fn style_nodes<S>(layout: &GraphLayout, styles: &S) -> Vec<StyledNode>
where
    S: StyleLookup + Sync,
{
    layout
        .nodes
        .par_iter()
        .map(|node| StyledNode {
            style: styles.resolve(node.op_type()).clone(),
            layout: node.clone(),
        })
        .collect()
}

/// Edges in input order, always pointing source to target even when the
/// layout reversed them for ranking.
pub fn render_edges(model: &GraphModel, show_labels: bool) -> Vec<RenderedEdge> {
    model
        .edges()
        .iter()
        .enumerate()
        .map(|(i, edge)| RenderedEdge {
            id: EdgeId(i),
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: (show_labels && !edge.tensor_name.is_empty())
                .then(|| edge.tensor_name.clone()),
            animated: true,
        })
        .collect()
}
