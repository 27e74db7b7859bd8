//! Coordinate assignment in the top-to-bottom frame.
//!
//! The rank axis is derived from the tallest node of each rank. The cross axis starts packed
//! and is refined by pulling every node towards the mean of its neighbours in the adjacent
//! rank, then restoring the minimum separation. Each placement is the mean of a left-packed
//! and a right-packed solution so neither side is favoured.

use crate::util::build_layer_matrix;
use crate::{GraphLabel, LayoutGraph, NodeLabel};
use rustc_hash::FxHashMap;

pub fn position(g: &mut LayoutGraph) {
    let layering = build_layer_matrix(g);
    if layering.is_empty() {
        return;
    }
    position_y(g, &layering);
    position_x(g, &layering);
}

fn position_y(g: &mut LayoutGraph, layering: &[Vec<String>]) {
    let ranksep = g.graph().ranksep;
    let mut prev_y = 0.0;
    for layer in layering {
        let max_height = layer
            .iter()
            .filter_map(|v| g.node(v).map(|n| n.height))
            .fold(0.0_f64, f64::max);
        for v in layer {
            if let Some(n) = g.node_mut(v) {
                n.y = Some(prev_y + max_height / 2.0);
            }
        }
        prev_y += max_height + ranksep;
    }
}

/// Minimum center-to-center distance between two neighbours of a rank.
pub fn separation(graph: &GraphLabel, a: &NodeLabel, b: &NodeLabel) -> f64 {
    let side = |n: &NodeLabel| if n.dummy { graph.edgesep } else { graph.nodesep };
    (a.width + b.width) / 2.0 + (side(a) + side(b)) / 2.0
}

fn position_x(g: &mut LayoutGraph, layering: &[Vec<String>]) {
    let graph = g.graph().clone();

    let mut xs: FxHashMap<String, f64> = FxHashMap::default();
    for layer in layering {
        let seps = layer_separations(g, &graph, layer);
        let mut x = 0.0;
        let mut packed = Vec::with_capacity(layer.len());
        for (i, v) in layer.iter().enumerate() {
            if i > 0 {
                x += seps[i - 1];
            }
            packed.push((v, x));
        }
        let mid = x / 2.0;
        for (v, x) in packed {
            xs.insert(v.clone(), x - mid);
        }
    }

    for round in 0..graph.position_iterations {
        let down = round % 2 == 0;
        let ranks: Vec<usize> = if down {
            (1..layering.len()).collect()
        } else {
            (0..layering.len().saturating_sub(1)).rev().collect()
        };
        for r in ranks {
            let layer = &layering[r];
            let desired: Vec<f64> = layer
                .iter()
                .map(|v| {
                    neighbour_mean(g, v, &xs, down)
                        .or_else(|| xs.get(v.as_str()).copied())
                        .unwrap_or(0.0)
                })
                .collect();
            let seps = layer_separations(g, &graph, layer);
            let placed = place_with_separation(&desired, &seps);
            for (v, x) in layer.iter().zip(placed) {
                xs.insert(v.clone(), x);
            }
        }
    }

    g.for_each_node_mut(|id, n| {
        if let Some(&x) = xs.get(id) {
            n.x = Some(x);
        }
    });
}

fn layer_separations(g: &LayoutGraph, graph: &GraphLabel, layer: &[String]) -> Vec<f64> {
    layer
        .windows(2)
        .map(|pair| match (g.node(&pair[0]), g.node(&pair[1])) {
            (Some(a), Some(b)) => separation(graph, a, b),
            _ => graph.nodesep,
        })
        .collect()
}

fn neighbour_mean(
    g: &LayoutGraph,
    v: &str,
    xs: &FxHashMap<String, f64>,
    use_predecessors: bool,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut weight = 0.0;
    let mut visit = |other: &str, w: f64| {
        if let Some(&x) = xs.get(other) {
            sum += w * x;
            weight += w;
        }
    };
    if use_predecessors {
        g.for_each_in_edge(v, |e, label| visit(&e.v, label.weight));
    } else {
        g.for_each_out_edge(v, |e, label| visit(&e.w, label.weight));
    }
    (weight > 0.0).then(|| sum / weight)
}

/// Closest placement to `desired` that keeps consecutive entries at least `seps[i]` apart.
pub fn place_with_separation(desired: &[f64], seps: &[f64]) -> Vec<f64> {
    let n = desired.len();
    if n == 0 {
        return Vec::new();
    }

    let mut left = desired.to_vec();
    for i in 1..n {
        left[i] = left[i].max(left[i - 1] + seps[i - 1]);
    }
    let mut right = desired.to_vec();
    for i in (0..n - 1).rev() {
        right[i] = right[i].min(right[i + 1] - seps[i]);
    }

    left.iter().zip(&right).map(|(l, r)| (l + r) / 2.0).collect()
}
