//! Layout stages assume ranks grow downwards. Horizontal directions swap node extents before
//! positioning and swap coordinates back afterwards; bottom-up and right-to-left mirror the
//! rank axis.

use crate::{LayoutGraph, RankDir};

pub fn adjust(g: &mut LayoutGraph) {
    if g.graph().rankdir.is_horizontal() {
        swap_width_height(g);
    }
}

pub fn undo(g: &mut LayoutGraph) {
    let rankdir = g.graph().rankdir;
    if matches!(rankdir, RankDir::BT | RankDir::RL) {
        reverse_y(g);
    }
    if rankdir.is_horizontal() {
        swap_xy(g);
        swap_width_height(g);
    }
}

fn swap_width_height(g: &mut LayoutGraph) {
    g.for_each_node_mut(|_id, n| {
        (n.width, n.height) = (n.height, n.width);
    });
}

fn reverse_y(g: &mut LayoutGraph) {
    g.for_each_node_mut(|_id, n| {
        if let Some(y) = n.y.as_mut() {
            *y = -*y;
        }
    });
    g.for_each_edge_mut(|_e, label| {
        for p in &mut label.points {
            p.y = -p.y;
        }
    });
}

fn swap_xy(g: &mut LayoutGraph) {
    g.for_each_node_mut(|_id, n| {
        (n.x, n.y) = (n.y, n.x);
    });
    g.for_each_edge_mut(|_e, label| {
        for p in &mut label.points {
            (p.x, p.y) = (p.y, p.x);
        }
    });
}
