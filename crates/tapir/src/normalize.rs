//! Split edges spanning several ranks into chains of unit-length edges.
//!
//! Each intermediate rank gets a zero-sized dummy node. `undo` walks the chains back, turning
//! dummy positions into bend points of the original edge.

use crate::graphlib::EdgeKey;
use crate::{EdgeLabel, LayoutGraph, NodeLabel, Point};

pub fn run(g: &mut LayoutGraph) {
    g.graph_mut().dummy_chains.clear();
    for e in g.edge_keys() {
        normalize_edge(g, e);
    }
}

fn normalize_edge(g: &mut LayoutGraph, e: EdgeKey) {
    let v_rank = g.node(&e.v).and_then(|n| n.rank).unwrap_or(0);
    let w_rank = g.node(&e.w).and_then(|n| n.rank).unwrap_or(0);
    if w_rank <= v_rank + 1 {
        return;
    }
    let Some(mut edge_label) = g.remove_edge_key(&e) else {
        return;
    };
    edge_label.points.clear();
    let weight = edge_label.weight;

    let mut prev = e.v.clone();
    for r in (v_rank + 1)..w_rank {
        let dummy = NodeLabel {
            rank: Some(r),
            dummy: true,
            edge_label: Some(edge_label.clone()),
            edge_obj: Some(e.clone()),
            ..Default::default()
        };
        let id = add_dummy_node(g, dummy);
        if r == v_rank + 1 {
            g.graph_mut().dummy_chains.push(id.clone());
        }
        g.set_edge_with_label(
            prev,
            id.as_str(),
            EdgeLabel {
                weight,
                ..Default::default()
            },
        );
        prev = id;
    }
    g.set_edge_with_label(
        prev,
        e.w.as_str(),
        EdgeLabel {
            weight,
            ..Default::default()
        },
    );
}

fn add_dummy_node(g: &mut LayoutGraph, label: NodeLabel) -> String {
    let mut i = g.node_count();
    loop {
        let id = format!("_d{i}");
        if !g.has_node(&id) {
            g.set_node(id.as_str(), label);
            return id;
        }
        i += 1;
    }
}

pub fn undo(g: &mut LayoutGraph) {
    let chains = std::mem::take(&mut g.graph_mut().dummy_chains);
    for head in chains {
        let Some(first) = g.node(&head).cloned() else {
            continue;
        };
        let (Some(mut label), Some(edge_obj)) = (first.edge_label, first.edge_obj) else {
            continue;
        };

        let mut v = head;
        loop {
            let Some(node) = g.node(&v) else {
                break;
            };
            if !node.dummy {
                break;
            }
            if let (Some(x), Some(y)) = (node.x, node.y) {
                label.points.push(Point::new(x, y));
            }
            let next = g.successors(&v).first().map(|s| s.to_string());
            g.remove_node(&v);
            match next {
                Some(w) => v = w,
                None => break,
            }
        }
        g.set_edge_key(edge_obj, label);
    }
}
