//! Synthetic graphs for the benchmarks.

use netscope_core::{GraphEdge, GraphNode, RawEdge, RawEdgeData, RawGraph, RawNode, RawNodeData};
use netscope_graph::GraphModel;

const OPS: &[&str] = &[
    "Conv", "BatchNormalization", "Relu", "Add", "MaxPool", "Gemm", "Reshape",
];

/// A ResNet-like stack: `blocks` residual blocks, each a conv/bn/relu chain
/// with a skip edge around it.
fn residual_parts(blocks: usize) -> (Vec<(String, &'static str)>, Vec<(String, String)>) {
    let mut nodes = vec![("input".to_string(), "Identity")];
    let mut edges = Vec::new();
    let mut previous = "input".to_string();

    for b in 0..blocks {
        let mut last = previous.clone();
        for (i, op) in ["Conv", "BatchNormalization", "Relu", "Conv", "BatchNormalization"]
            .iter()
            .enumerate()
        {
            let id = format!("b{b}_{i}");
            nodes.push((id.clone(), *op));
            edges.push((last, id.clone()));
            last = id;
        }
        let add = format!("b{b}_add");
        nodes.push((add.clone(), "Add"));
        edges.push((last, add.clone()));
        edges.push((previous, add.clone()));
        previous = add;
    }
    (nodes, edges)
}

pub fn residual_model(blocks: usize) -> GraphModel {
    let (nodes, edges) = residual_parts(blocks);
    GraphModel::build(
        nodes.iter().map(|(id, op)| GraphNode::new(id.as_str(), *op)),
        edges
            .iter()
            .map(|(s, t)| GraphEdge::new(s.as_str(), t.as_str(), format!("{s}:out"))),
    )
    .unwrap_or_default()
}

/// Wide fan-out/fan-in layers, `width` nodes per layer, fully connected to
/// the next layer.
pub fn layered_model(layers: usize, width: usize) -> GraphModel {
    let id = |l: usize, i: usize| format!("l{l}n{i}");
    let nodes = (0..layers)
        .flat_map(|l| (0..width).map(move |i| (l, i)))
        .map(|(l, i)| GraphNode::new(id(l, i), OPS[(l + i) % OPS.len()]));
    let edges = (1..layers).flat_map(|l| {
        (0..width).flat_map(move |i| {
            (0..width).map(move |j| GraphEdge::new(id(l - 1, (i * 7 + j) % width), id(l, j), ""))
        })
    });
    GraphModel::build(nodes, edges).unwrap_or_default()
}

pub fn residual_payload(blocks: usize) -> RawGraph {
    let (nodes, edges) = residual_parts(blocks);
    RawGraph {
        nodes: nodes
            .into_iter()
            .map(|(id, op)| RawNode {
                label: id.clone(),
                id,
                op_type: op.to_string(),
                data: RawNodeData::default(),
            })
            .collect(),
        edges: edges
            .into_iter()
            .map(|(source, target)| RawEdge {
                data: Some(RawEdgeData {
                    tensor_name: format!("{source}:out"),
                }),
                source,
                target,
            })
            .collect(),
    }
}
