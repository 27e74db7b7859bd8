//! Helpers shared by the layout stages.

use crate::{LayoutGraph, NodeLabel, Point};

pub fn max_rank(g: &LayoutGraph) -> Option<i32> {
    g.nodes()
        .filter_map(|v| g.node(v).and_then(|n| n.rank))
        .max()
}

/// Nodes grouped by rank, each rank sorted by `order` (insertion order when unset).
pub fn build_layer_matrix(g: &LayoutGraph) -> Vec<Vec<String>> {
    let Some(max) = max_rank(g) else {
        return Vec::new();
    };
    let mut layers: Vec<Vec<(usize, String)>> = vec![Vec::new(); (max.max(0) + 1) as usize];
    for (i, v) in g.nodes().enumerate() {
        let Some(n) = g.node(v) else { continue };
        let Some(rank) = n.rank else { continue };
        if rank < 0 {
            continue;
        }
        layers[rank as usize].push((n.order.unwrap_or(i), v.to_string()));
    }
    layers
        .into_iter()
        .map(|mut layer| {
            layer.sort_by_key(|(o, _)| *o);
            layer.into_iter().map(|(_, v)| v).collect()
        })
        .collect()
}

/// Point where the segment from the node center towards `point` leaves the node box.
pub fn intersect_rect(node: &NodeLabel, point: Point) -> Point {
    let x = node.x.unwrap_or(0.0);
    let y = node.y.unwrap_or(0.0);
    let dx = point.x - x;
    let dy = point.y - y;
    let w = node.width / 2.0;
    let h = node.height / 2.0;

    if dx == 0.0 && dy == 0.0 {
        return Point::new(x, y);
    }

    let (sx, sy) = if dy.abs() * w > dx.abs() * h {
        let sy = if dy < 0.0 { -h } else { h };
        (sy * dx / dy, sy)
    } else {
        let sx = if dx < 0.0 { -w } else { w };
        (sx, sx * dy / dx)
    };
    Point::new(x + sx, y + sy)
}

/// Moves the drawing so its top-left corner sits at the margins and records the extent.
pub fn translate_graph(g: &mut LayoutGraph) {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for v in g.nodes() {
        let Some(n) = g.node(v) else { continue };
        let (Some(x), Some(y)) = (n.x, n.y) else {
            continue;
        };
        min_x = min_x.min(x - n.width / 2.0);
        max_x = max_x.max(x + n.width / 2.0);
        min_y = min_y.min(y - n.height / 2.0);
        max_y = max_y.max(y + n.height / 2.0);
    }
    for e in g.edges() {
        let Some(label) = g.edge_by_key(e) else { continue };
        for p in &label.points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
    }

    if !min_x.is_finite() {
        let (mx, my) = (g.graph().marginx, g.graph().marginy);
        let label = g.graph_mut();
        label.width = 2.0 * mx;
        label.height = 2.0 * my;
        return;
    }

    let marginx = g.graph().marginx;
    let marginy = g.graph().marginy;
    let dx = marginx - min_x;
    let dy = marginy - min_y;

    g.for_each_node_mut(|_id, n| {
        if let Some(x) = n.x.as_mut() {
            *x += dx;
        }
        if let Some(y) = n.y.as_mut() {
            *y += dy;
        }
    });
    g.for_each_edge_mut(|_e, label| {
        for p in &mut label.points {
            p.x += dx;
            p.y += dy;
        }
    });

    let label = g.graph_mut();
    label.width = max_x - min_x + 2.0 * marginx;
    label.height = max_y - min_y + 2.0 * marginy;
}

/// Adds the endpoints where each edge meets its source and target boxes.
pub fn assign_node_intersects(g: &mut LayoutGraph) {
    for e in g.edge_keys() {
        let (Some(v), Some(w)) = (g.node(&e.v).cloned(), g.node(&e.w).cloned()) else {
            continue;
        };
        let Some(label) = g.edge_mut_by_key(&e) else {
            continue;
        };
        let center = |n: &NodeLabel| Point::new(n.x.unwrap_or(0.0), n.y.unwrap_or(0.0));
        let toward_v = label.points.first().copied().unwrap_or_else(|| center(&w));
        let toward_w = label.points.last().copied().unwrap_or_else(|| center(&v));
        label.points.insert(0, intersect_rect(&v, toward_v));
        label.points.push(intersect_rect(&w, toward_w));
    }
}
