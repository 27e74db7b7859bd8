//! Canvas layout: sizes layer nodes and runs the layered layout over the model graph.

use crate::config::LayoutConfig;
use crate::model::{Edge, Layer, LayerKind, LayerType, NodePositions, Point};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tapir::{GraphLabel, LayoutGraph, NodeLabel};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    /// Renderer tag, see [`node_kind`].
    #[serde(rename = "type")]
    pub node_type: &'static str,
    /// Top-left corner.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub data: Layer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub animated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<LayerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<LayerType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutResult {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn positions(&self) -> NodePositions {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }
}

/// Renderer tag for each layer type.
pub fn node_kind(layer_type: LayerType) -> &'static str {
    match layer_type {
        LayerType::Input => "inputNode",
        LayerType::Linear => "linearNode",
        LayerType::Conv2d => "convNode",
        LayerType::MaxPool2d | LayerType::AvgPool2d | LayerType::AdaptiveAvgPool2d => {
            "poolingNode"
        }
        LayerType::Relu | LayerType::Sigmoid | LayerType::Tanh | LayerType::Softmax => {
            "activationNode"
        }
        LayerType::BatchNorm | LayerType::LayerNorm | LayerType::Lrn => "normNode",
        LayerType::Dropout => "dropoutNode",
        LayerType::Add | LayerType::Concat | LayerType::Flatten => "calculateNode",
        LayerType::Sequential => "sequentialNode",
        LayerType::Parallel => "parallelNode",
        LayerType::Embedding => "embeddingNode",
        LayerType::SelfAttention | LayerType::CrossAttention => "attentionNode",
    }
}

/// Box size of a layer node. Composites grow with their content.
pub fn node_size(layer: &Layer, config: &LayoutConfig) -> (f64, f64) {
    let width = config.node_width;
    let height = config.node_height;
    match &layer.kind {
        LayerKind::Sequential { steps } => (
            width.max(320.0),
            (160.0 + 30.0 * steps.len() as f64).max(200.0),
        ),
        LayerKind::Parallel { branches } => {
            let count = branches.len() as f64;
            let total_steps: usize = branches.iter().map(|b| b.steps.len()).sum();
            (
                (width + 50.0 * count).max(320.0),
                (180.0 + 60.0 * count + 18.0 * total_steps as f64).max(240.0),
            )
        }
        LayerKind::Add | LayerKind::Concat { .. } | LayerKind::Flatten => {
            (width.max(240.0), height.max(140.0))
        }
        _ => (width, height),
    }
}

/// Computes node positions for every layer and decorates edges for rendering.
///
/// Edges whose endpoints are missing do not take part in the layout but are still reported.
pub fn calculate_layout(layers: &[Layer], edges: &[Edge], config: &LayoutConfig) -> LayoutResult {
    let mut g = LayoutGraph::default();
    g.set_graph(GraphLabel {
        rankdir: config.direction,
        nodesep: config.node_sep,
        ranksep: config.rank_sep,
        marginx: config.margin_x,
        marginy: config.margin_y,
        ..Default::default()
    });

    let mut sizes = Vec::with_capacity(layers.len());
    for layer in layers {
        let (w, h) = node_size(layer, config);
        sizes.push((w, h));
        g.set_node(layer.id.as_str(), NodeLabel::sized(w, h));
    }

    let ids: FxHashSet<&str> = layers.iter().map(|l| l.id.as_str()).collect();
    for edge in edges {
        if ids.contains(edge.source.as_str()) && ids.contains(edge.target.as_str()) {
            g.set_edge(edge.source.as_str(), edge.target.as_str());
        } else {
            tracing::debug!(edge = %edge.id, "edge endpoint missing; skipped by layout");
        }
    }

    tapir::layout(&mut g);

    let nodes = layers
        .iter()
        .zip(sizes)
        .map(|(layer, (w, h))| {
            let label = g.node(layer.id.as_str());
            let cx = label.and_then(|n| n.x).unwrap_or(w / 2.0);
            let cy = label.and_then(|n| n.y).unwrap_or(h / 2.0);
            LayoutNode {
                id: layer.id.clone(),
                node_type: node_kind(layer.layer_type()),
                position: Point::new(cx - w / 2.0, cy - h / 2.0),
                width: w,
                height: h,
                data: layer.clone(),
            }
        })
        .collect();

    let type_of = |id: &str| layers.iter().find(|l| l.id == id).map(Layer::layer_type);
    let edges = edges
        .iter()
        .map(|edge| LayoutEdge {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            label: edge.label.clone(),
            edge_type: edge
                .edge_type
                .clone()
                .unwrap_or_else(|| "normal".to_string()),
            animated: true,
            source_type: type_of(&edge.source),
            target_type: type_of(&edge.target),
        })
        .collect();

    LayoutResult { nodes, edges }
}

/// Replaces computed positions with the user-pinned ones where present.
pub fn merge_positions(mut result: LayoutResult, pinned: &NodePositions) -> LayoutResult {
    for node in &mut result.nodes {
        if let Some(p) = pinned.get(&node.id) {
            node.position = *p;
        }
    }
    result
}
