//! Rank assignment.

use crate::LayoutGraph;
use crate::graphlib::alg;
use rustc_hash::FxHashMap;

/// Longest-path ranking: sources sit on rank 0 and every edge spans at least `minlen` ranks.
///
/// Expects an acyclic graph. Nodes left over by a cycle keep rank 0.
pub fn longest_path(g: &mut LayoutGraph) {
    let order = alg::topsort(g).unwrap_or_else(|_| g.node_ids());

    let mut ranks: FxHashMap<String, i32> = FxHashMap::default();
    for v in &order {
        let mut rank = 0i32;
        g.for_each_in_edge(v, |e, label| {
            if e.is_self_loop() {
                return;
            }
            if let Some(&r) = ranks.get(e.v.as_str()) {
                rank = rank.max(r + label.minlen.max(1) as i32);
            }
        });
        ranks.insert(v.clone(), rank);
    }

    g.for_each_node_mut(|id, n| {
        n.rank = Some(ranks.get(id).copied().unwrap_or(0));
    });
}

/// Shifts ranks so the smallest one is zero.
pub fn normalize_ranks(g: &mut LayoutGraph) {
    let min = g
        .nodes()
        .filter_map(|v| g.node(v).and_then(|n| n.rank))
        .min()
        .unwrap_or(0);
    if min == 0 {
        return;
    }
    g.for_each_node_mut(|_id, n| {
        if let Some(r) = n.rank.as_mut() {
            *r -= min;
        }
    });
}
