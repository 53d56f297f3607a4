use netscope_core::{EmptyGraphWarning, LayoutDirection, NodeId};
use netscope_graph::{
    GraphLayout, GraphModel, Legend, RenderedEdge, StyleTaxonomy, StyledNode, ViewportSpec,
    render_edges, style_nodes,
};
use serde::{Deserialize, Serialize};

/// Everything a host needs to draw one frame. Immutable once published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub direction: LayoutDirection,
    pub show_edge_labels: bool,
    pub nodes: Vec<StyledNode>,
    pub edges: Vec<RenderedEdge>,
    pub legend: Legend,
    pub viewport: ViewportSpec,
    pub rank_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<EmptyGraphWarning>,
}

impl GraphSnapshot {
    pub(crate) fn build(
        model: &GraphModel,
        layout: &GraphLayout,
        styles: &StyleTaxonomy,
        show_edge_labels: bool,
        viewport: ViewportSpec,
    ) -> Self {
        Self {
            direction: layout.direction,
            show_edge_labels,
            nodes: style_nodes(layout, styles),
            edges: render_edges(model, show_edge_labels),
            legend: Legend::from_nodes(model.nodes(), styles),
            viewport,
            rank_count: layout.rank_count,
            selected: None,
            warning: model.is_empty().then_some(EmptyGraphWarning),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&StyledNode> {
        self.nodes.iter().find(|n| n.layout.id() == id)
    }
}
