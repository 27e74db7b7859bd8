//! Break cycles by reversing a DFS feedback arc set.

use crate::LayoutGraph;
use crate::graphlib::EdgeKey;
use rustc_hash::FxHashSet;

/// Reverses back edges so the graph becomes a DAG. Reversed edges are renamed so they can
/// coexist with an existing edge in the opposite direction; `undo` restores them.
pub fn run(g: &mut LayoutGraph) {
    for e in dfs_fas(g) {
        let Some(mut label) = g.remove_edge_key(&e) else {
            continue;
        };
        label.forward_name = e.name.clone();
        label.reversed = true;
        let name = unique_rev_name(g, &e.w, &e.v);
        g.set_edge_named(e.w, e.v, Some(name), Some(label));
    }
}

pub fn undo(g: &mut LayoutGraph) {
    for e in g.edge_keys() {
        if !g.edge_by_key(&e).is_some_and(|l| l.reversed) {
            continue;
        }
        let Some(mut label) = g.remove_edge_key(&e) else {
            continue;
        };
        let forward_name = label.forward_name.take();
        label.reversed = false;
        label.points.reverse();
        g.set_edge_named(e.w, e.v, forward_name, Some(label));
    }
}

fn unique_rev_name(g: &LayoutGraph, v: &str, w: &str) -> String {
    let mut i = 1usize;
    loop {
        let candidate = format!("rev{i}");
        if !g.has_edge(v, w, Some(&candidate)) {
            return candidate;
        }
        i += 1;
    }
}

/// Edges closing a cycle during a depth-first walk in node insertion order.
pub fn dfs_fas(g: &LayoutGraph) -> Vec<EdgeKey> {
    fn dfs(
        g: &LayoutGraph,
        v: &str,
        visited: &mut FxHashSet<String>,
        on_stack: &mut FxHashSet<String>,
        fas: &mut Vec<EdgeKey>,
    ) {
        if !visited.insert(v.to_string()) {
            return;
        }
        on_stack.insert(v.to_string());
        for e in g.out_edges(v, None) {
            if e.is_self_loop() {
                continue;
            }
            if on_stack.contains(&e.w) {
                fas.push(e);
            } else {
                dfs(g, &e.w, visited, on_stack, fas);
            }
        }
        on_stack.remove(v);
    }

    let mut fas = Vec::new();
    let mut visited = FxHashSet::default();
    let mut on_stack = FxHashSet::default();
    for v in g.nodes() {
        dfs(g, v, &mut visited, &mut on_stack, &mut fas);
    }
    fas
}
