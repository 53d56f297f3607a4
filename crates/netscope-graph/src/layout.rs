use crate::graph::{EdgeIndex, GraphModel, NodeIndex};
use netscope_core::{GraphNode, LayoutDirection, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub trait Layouter {
    fn execute(&self, model: &GraphModel) -> GraphLayout;
}

/// Gap between neighbouring nodes in a rank and between consecutive ranks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Separation {
    pub node: f32,
    pub rank: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    /// Used for `TopToBottom`.
    pub vertical: Separation,
    /// Used for `LeftToRight`; ranks sit further apart when the flow is horizontal.
    pub horizontal: Separation,
    /// Upper bound on down/up barycenter sweep pairs.
    pub sweep_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: Self::DEFAULT_NODE_WIDTH,
            node_height: Self::DEFAULT_NODE_HEIGHT,
            vertical: Separation {
                node: 40.0,
                rank: 80.0,
            },
            horizontal: Separation {
                node: 80.0,
                rank: 200.0,
            },
            sweep_iterations: Self::DEFAULT_SWEEP_ITERATIONS,
        }
    }
}

impl LayoutConfig {
    pub const DEFAULT_NODE_WIDTH: f32 = 220.0;
    pub const DEFAULT_NODE_HEIGHT: f32 = 80.0;
    pub const DEFAULT_SWEEP_ITERATIONS: usize = 8;

    pub fn for_direction(&self, direction: LayoutDirection) -> Separation {
        match direction {
            LayoutDirection::TopToBottom => self.vertical,
            LayoutDirection::LeftToRight => self.horizontal,
        }
    }
}

/// A graph node with its layout-assigned placement. `x`/`y` is the top-left
/// corner of the node box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    #[serde(flatten)]
    pub node: GraphNode,
    pub rank: usize,
    pub order_in_rank: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutNode {
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }

    pub fn op_type(&self) -> &str {
        &self.node.op_type
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One complete layout. Produced whole and never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLayout {
    pub direction: LayoutDirection,
    /// Same order as the model's nodes.
    pub nodes: Vec<LayoutNode>,
    /// Edges that were reversed while ranking to break cycles.
    pub reversed_edges: Vec<EdgeIndex>,
    pub rank_count: usize,
    /// Crossings between edges of adjacent ranks after ordering.
    pub crossings: usize,
}

impl GraphLayout {
    pub fn get(&self, id: &NodeId) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Three-phase layered layout: ranking, crossing reduction, coordinates.
pub struct LayeredLayouter {
    pub config: LayoutConfig,
    pub direction: LayoutDirection,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnStack,
    Done,
}

/// Edges with cycle-breaking reversals applied and self-loops removed.
struct RankGraph {
    edges: Vec<(NodeIndex, NodeIndex)>,
    successors: Vec<Vec<NodeIndex>>,
    predecessors: Vec<Vec<NodeIndex>>,
}

impl RankGraph {
    fn new(node_count: usize, edges: Vec<(NodeIndex, NodeIndex)>) -> Self {
        let mut successors = vec![Vec::new(); node_count];
        let mut predecessors = vec![Vec::new(); node_count];
        for &(source, target) in &edges {
            successors[source.0].push(target);
            predecessors[target.0].push(source);
        }
        Self {
            edges,
            successors,
            predecessors,
        }
    }
}

impl LayeredLayouter {
    pub fn new(direction: LayoutDirection) -> Self {
        Self {
            config: LayoutConfig::default(),
            direction,
        }
    }

    pub fn with_config(config: LayoutConfig, direction: LayoutDirection) -> Self {
        Self { config, direction }
    }

    /// Marks the edges closing a cycle, found by an iterative depth-first walk.
    ///
    /// Sources (in-degree 0) are walked first in node order, then any node
    /// still unvisited; successors are followed in edge input order. An edge
    /// into a node still on the DFS stack is a back-edge.
    fn find_back_edges(model: &GraphModel) -> Vec<bool> {
        let node_count = model.node_count();
        let mut outgoing: Vec<Vec<(EdgeIndex, NodeIndex)>> = vec![Vec::new(); node_count];
        let mut in_degree = vec![0usize; node_count];
        for edge_idx in model.edge_indices() {
            if let Some((source, target)) = model.edge_endpoints(edge_idx)
                && source != target
            {
                outgoing[source.0].push((edge_idx, target));
                in_degree[target.0] += 1;
            }
        }

        let roots = model
            .node_indices()
            .filter(|idx| in_degree[idx.0] == 0)
            .chain(model.node_indices());

        let mut reversed = vec![false; model.edge_count()];
        let mut state = vec![Visit::Unvisited; node_count];
        let mut stack: Vec<(NodeIndex, usize)> = Vec::new();

        for root in roots {
            if state[root.0] != Visit::Unvisited {
                continue;
            }
            state[root.0] = Visit::OnStack;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, cursor) = *frame;
                match outgoing[node.0].get(cursor) {
                    Some(&(edge_idx, target)) => {
                        frame.1 += 1;
                        match state[target.0] {
                            Visit::OnStack => reversed[edge_idx.0] = true,
                            Visit::Unvisited => {
                                state[target.0] = Visit::OnStack;
                                stack.push((target, 0));
                            }
                            Visit::Done => {}
                        }
                    }
                    None => {
                        state[node.0] = Visit::Done;
                        stack.pop();
                    }
                }
            }
        }

        reversed
    }

    fn rank_graph(model: &GraphModel, reversed: &[bool]) -> RankGraph {
        let edges = model
            .edge_indices()
            .filter_map(|edge_idx| {
                let (source, target) = model.edge_endpoints(edge_idx)?;
                if source == target {
                    None
                } else if reversed[edge_idx.0] {
                    Some((target, source))
                } else {
                    Some((source, target))
                }
            })
            .collect();
        RankGraph::new(model.node_count(), edges)
    }

    /// Longest path from any source, via Kahn's topological order.
    fn assign_ranks(graph: &RankGraph) -> Vec<usize> {
        let node_count = graph.successors.len();
        let mut in_degree: Vec<usize> = graph.predecessors.iter().map(Vec::len).collect();
        let mut ranks = vec![0usize; node_count];
        let mut queue: VecDeque<usize> = (0..node_count).filter(|&i| in_degree[i] == 0).collect();
        let mut processed = 0;

        while let Some(node) = queue.pop_front() {
            processed += 1;
            for &next in &graph.successors[node] {
                ranks[next.0] = ranks[next.0].max(ranks[node] + 1);
                in_degree[next.0] -= 1;
                if in_degree[next.0] == 0 {
                    queue.push_back(next.0);
                }
            }
        }

        debug_assert_eq!(
            processed, node_count,
            "rank graph still cyclic after back-edge reversal"
        );
        ranks
    }

    fn build_layers(ranks: &[usize]) -> Vec<Vec<NodeIndex>> {
        let rank_count = ranks.iter().max().map_or(0, |&max| max + 1);
        let mut layers = vec![Vec::new(); rank_count];
        for (i, &rank) in ranks.iter().enumerate() {
            layers[rank].push(NodeIndex(i));
        }
        layers
    }

    /// Layer positions are centred on zero so layers of different widths
    /// line up the same way the final coordinates will.
    fn update_positions(layer: &[NodeIndex], positions: &mut [f32]) {
        let offset = (layer.len() as f32 - 1.0) / 2.0;
        for (j, node) in layer.iter().enumerate() {
            positions[node.0] = j as f32 - offset;
        }
    }

    fn order_layer_by_barycenter(
        layer: &mut Vec<NodeIndex>,
        neighbors: &[Vec<NodeIndex>],
        positions: &mut [f32],
    ) {
        let mut keyed: Vec<(f32, NodeIndex)> = layer
            .iter()
            .map(|&node| {
                let adjacent = &neighbors[node.0];
                let barycenter = if adjacent.is_empty() {
                    positions[node.0]
                } else {
                    adjacent.iter().map(|n| positions[n.0]).sum::<f32>() / adjacent.len() as f32
                };
                (barycenter, node)
            })
            .collect();

        // Stable: equal barycenters keep their previous relative order.
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        *layer = keyed.into_iter().map(|(_, node)| node).collect();
        Self::update_positions(layer, positions);
    }

    /// Counts crossings between edges joining adjacent ranks. Edges that
    /// span several ranks are not counted.
    fn count_crossings(layers: &[Vec<NodeIndex>], graph: &RankGraph, ranks: &[usize]) -> usize {
        let mut order = vec![0usize; ranks.len()];
        for layer in layers {
            for (j, node) in layer.iter().enumerate() {
                order[node.0] = j;
            }
        }

        let mut by_rank: Vec<Vec<(usize, usize)>> = vec![Vec::new(); layers.len()];
        for &(source, target) in &graph.edges {
            if ranks[target.0] == ranks[source.0] + 1 {
                by_rank[ranks[source.0]].push((order[source.0], order[target.0]));
            }
        }

        let mut crossings = 0;
        for (rank, mut pairs) in by_rank.into_iter().enumerate() {
            if pairs.len() < 2 {
                continue;
            }
            pairs.sort_unstable();
            // Fenwick tree over target positions in the next rank.
            let width = layers[rank + 1].len();
            let mut tree = vec![0usize; width + 1];
            for (inserted, &(_, target)) in pairs.iter().enumerate() {
                let mut i = target + 1;
                let mut at_most = 0;
                while i > 0 {
                    at_most += tree[i];
                    i &= i - 1;
                }
                crossings += inserted - at_most;

                let mut i = target + 1;
                while i <= width {
                    tree[i] += 1;
                    i += i & i.wrapping_neg();
                }
            }
        }
        crossings
    }

    /// Alternating down/up barycenter sweeps. Keeps the ordering with the
    /// fewest crossings seen and stops early once a sweep changes nothing.
    fn order_layers(
        &self,
        layers: &mut Vec<Vec<NodeIndex>>,
        graph: &RankGraph,
        ranks: &[usize],
    ) -> usize {
        let mut positions = vec![0.0f32; ranks.len()];
        for layer in layers.iter() {
            Self::update_positions(layer, &mut positions);
        }

        let mut best = layers.clone();
        let mut best_crossings = Self::count_crossings(layers, graph, ranks);

        for _ in 0..self.config.sweep_iterations {
            if best_crossings == 0 {
                break;
            }
            let before = layers.clone();

            for rank in 1..layers.len() {
                Self::order_layer_by_barycenter(
                    &mut layers[rank],
                    &graph.predecessors,
                    &mut positions,
                );
            }
            for rank in (0..layers.len().saturating_sub(1)).rev() {
                Self::order_layer_by_barycenter(
                    &mut layers[rank],
                    &graph.successors,
                    &mut positions,
                );
            }

            let crossings = Self::count_crossings(layers, graph, ranks);
            if crossings < best_crossings {
                best_crossings = crossings;
                best = layers.clone();
            }
            if *layers == before {
                break;
            }
        }

        *layers = best;
        best_crossings
    }

    fn assign_coordinates(
        &self,
        model: &GraphModel,
        layers: &[Vec<NodeIndex>],
    ) -> Vec<Option<LayoutNode>> {
        let width = self.config.node_width;
        let height = self.config.node_height;
        let separation = self.config.for_direction(self.direction);
        let (rank_extent, cross_extent) = match self.direction {
            LayoutDirection::TopToBottom => (height, width),
            LayoutDirection::LeftToRight => (width, height),
        };

        let mut placed: Vec<Option<LayoutNode>> = vec![None; model.node_count()];
        for (rank, layer) in layers.iter().enumerate() {
            let primary = rank as f32 * (rank_extent + separation.rank);
            let total = layer.len() as f32 * cross_extent
                + layer.len().saturating_sub(1) as f32 * separation.node;
            let mut secondary = -total / 2.0;

            for (order, &node_idx) in layer.iter().enumerate() {
                let (x, y) = match self.direction {
                    LayoutDirection::TopToBottom => (secondary, primary),
                    LayoutDirection::LeftToRight => (primary, secondary),
                };
                placed[node_idx.0] = Some(LayoutNode {
                    node: model[node_idx].clone(),
                    rank,
                    order_in_rank: order,
                    x,
                    y,
                    width,
                    height,
                });
                secondary += cross_extent + separation.node;
            }
        }
        placed
    }
}

impl Layouter for LayeredLayouter {
    fn execute(&self, model: &GraphModel) -> GraphLayout {
        debug_assert!(
            self.config.node_width > 0.0 && self.config.node_height > 0.0,
            "node dimensions must be positive"
        );

        if model.is_empty() {
            return GraphLayout {
                direction: self.direction,
                ..GraphLayout::default()
            };
        }

        let reversed = Self::find_back_edges(model);
        let reversed_edges: Vec<EdgeIndex> = reversed
            .iter()
            .enumerate()
            .filter(|(_, r)| **r)
            .map(|(i, _)| EdgeIndex(i))
            .collect();
        if !reversed_edges.is_empty() {
            tracing::warn!(
                "Reversed {} edge(s) to break cycles before ranking",
                reversed_edges.len()
            );
        }

        let rank_graph = Self::rank_graph(model, &reversed);
        let ranks = Self::assign_ranks(&rank_graph);
        let mut layers = Self::build_layers(&ranks);
        let crossings = self.order_layers(&mut layers, &rank_graph, &ranks);
        let nodes: Vec<LayoutNode> = self
            .assign_coordinates(model, &layers)
            .into_iter()
            .flatten()
            .collect();

        tracing::debug!(
            nodes = nodes.len(),
            ranks = layers.len(),
            crossings,
            direction = self.direction.code(),
            "layered layout complete"
        );

        GraphLayout {
            direction: self.direction,
            nodes,
            reversed_edges,
            rank_count: layers.len(),
            crossings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netscope_core::GraphEdge;

    fn model(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> GraphModel {
        GraphModel::build(
            nodes.iter().map(|(id, op)| GraphNode::new(*id, *op)),
            edges
                .iter()
                .map(|(s, t)| GraphEdge::new(*s, *t, format!("{s}->{t}"))),
        )
        .unwrap()
    }

    fn rank_of(layout: &GraphLayout, id: &str) -> usize {
        layout.get(&NodeId::from(id)).unwrap().rank
    }

    #[test]
    fn test_chain_ranks() {
        let m = model(
            &[("a", "Conv"), ("b", "ReLU"), ("c", "Gemm")],
            &[("a", "b"), ("b", "c")],
        );
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);

        assert_eq!(rank_of(&layout, "a"), 0);
        assert_eq!(rank_of(&layout, "b"), 1);
        assert_eq!(rank_of(&layout, "c"), 2);
        assert_eq!(layout.rank_count, 3);
        assert!(layout.reversed_edges.is_empty());
    }

    #[test]
    fn test_longest_path_ranking() {
        // a -> c directly and via b: c must sit below b.
        let m = model(
            &[("a", "Add"), ("b", "Add"), ("c", "Add")],
            &[("a", "c"), ("a", "b"), ("b", "c")],
        );
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        assert_eq!(rank_of(&layout, "c"), 2);
    }

    #[test]
    fn test_two_cycle_does_not_panic() {
        let m = model(&[("a", "Add"), ("b", "Add")], &[("a", "b"), ("b", "a")]);
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);

        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(rank_of(&layout, "a"), 0);
        assert_eq!(rank_of(&layout, "b"), 1);
        assert_eq!(layout.reversed_edges, vec![EdgeIndex(1)]);
    }

    #[test]
    fn test_self_loop_is_ignored() {
        let m = model(&[("a", "Add"), ("b", "Add")], &[("a", "a"), ("a", "b")]);
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        assert_eq!(rank_of(&layout, "a"), 0);
        assert_eq!(rank_of(&layout, "b"), 1);
        assert!(layout.reversed_edges.is_empty());
    }

    #[test]
    fn test_cycle_with_entry_breaks_closing_edge() {
        // x -> a -> b -> c -> a: the DFS starts at source x, so c -> a closes the cycle.
        let m = model(
            &[("x", "Add"), ("a", "Add"), ("b", "Add"), ("c", "Add")],
            &[("x", "a"), ("a", "b"), ("b", "c"), ("c", "a")],
        );
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        assert_eq!(layout.reversed_edges, vec![EdgeIndex(3)]);
        assert_eq!(rank_of(&layout, "x"), 0);
        assert_eq!(rank_of(&layout, "a"), 1);
        assert_eq!(rank_of(&layout, "b"), 2);
        assert_eq!(rank_of(&layout, "c"), 3);
    }

    #[test]
    fn test_barycenter_removes_crossing() {
        let m = model(
            &[("a", "Add"), ("b", "Add"), ("c", "Add"), ("d", "Add")],
            &[("a", "d"), ("b", "c")],
        );
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        assert_eq!(layout.crossings, 0);

        let a = layout.get(&NodeId::from("a")).unwrap();
        let b = layout.get(&NodeId::from("b")).unwrap();
        let c = layout.get(&NodeId::from("c")).unwrap();
        let d = layout.get(&NodeId::from("d")).unwrap();
        assert_eq!(a.order_in_rank < b.order_in_rank, d.order_in_rank < c.order_in_rank);
    }

    #[test]
    fn test_coordinates_top_to_bottom() {
        let m = model(
            &[("a", "Add"), ("b", "Add"), ("c", "Add")],
            &[("a", "b"), ("a", "c")],
        );
        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        let a = layout.get(&NodeId::from("a")).unwrap();
        let b = layout.get(&NodeId::from("b")).unwrap();
        let c = layout.get(&NodeId::from("c")).unwrap();

        // Single node in rank 0 is centred on the axis.
        assert_eq!(a.x, -110.0);
        assert_eq!(a.y, 0.0);
        // Rank 1: two nodes, 220 wide with 40 between, centred.
        assert_eq!(b.y, 160.0);
        assert_eq!(b.x, -240.0);
        assert_eq!(c.x, 20.0);
        assert_eq!((a.width, a.height), (220.0, 80.0));
    }

    #[test]
    fn test_direction_changes_primary_axis() {
        let m = model(&[("a", "Add"), ("b", "Add")], &[("a", "b")]);
        let vertical = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        let horizontal = LayeredLayouter::new(LayoutDirection::LeftToRight).execute(&m);

        let (va, vb) = (&vertical.nodes[0], &vertical.nodes[1]);
        let (ha, hb) = (&horizontal.nodes[0], &horizontal.nodes[1]);
        assert_eq!(vb.y - va.y, 80.0 + 80.0);
        assert_eq!(va.x, vb.x);
        assert_eq!(hb.x - ha.x, 220.0 + 200.0);
        assert_eq!(ha.y, hb.y);
    }

    #[test]
    fn test_toggle_preserves_topology() {
        let m = model(
            &[("a", "Add"), ("b", "Add"), ("c", "Add"), ("d", "Add"), ("e", "Add")],
            &[("a", "c"), ("b", "c"), ("a", "d"), ("c", "e"), ("d", "e")],
        );
        let tb = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        let lr = LayeredLayouter::new(LayoutDirection::LeftToRight).execute(&m);
        let back = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);

        let topo = |l: &GraphLayout| -> Vec<(usize, usize)> {
            l.nodes.iter().map(|n| (n.rank, n.order_in_rank)).collect()
        };
        assert_eq!(topo(&tb), topo(&lr));
        assert_eq!(tb, back);
    }

    #[test]
    fn test_empty_graph() {
        let layout = LayeredLayouter::new(LayoutDirection::LeftToRight).execute(&GraphModel::new());
        assert!(layout.is_empty());
        assert_eq!(layout.rank_count, 0);
        assert_eq!(layout.direction, LayoutDirection::LeftToRight);
    }

    #[test]
    fn test_high_fan_out_completes() {
        let mut nodes = vec![("root".to_string(), "Constant")];
        let mut edges = Vec::new();
        for i in 0..200 {
            nodes.push((format!("n{i}"), "Add"));
            edges.push(("root".to_string(), format!("n{i}")));
        }
        let m = GraphModel::build(
            nodes.iter().map(|(id, op)| GraphNode::new(id.as_str(), *op)),
            edges.iter().map(|(s, t)| GraphEdge::new(s.as_str(), t.as_str(), "")),
        )
        .unwrap();

        let layout = LayeredLayouter::new(LayoutDirection::TopToBottom).execute(&m);
        assert_eq!(layout.nodes.len(), 201);
        assert_eq!(layout.rank_count, 2);
        assert_eq!(layout.crossings, 0);
    }

    #[test]
    fn test_config_round_trips_with_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"node_width": 180.0}"#).unwrap();
        assert_eq!(config.node_width, 180.0);
        assert_eq!(config.node_height, LayoutConfig::DEFAULT_NODE_HEIGHT);
        assert_eq!(config.for_direction(LayoutDirection::LeftToRight).rank, 200.0);
    }
}
