//! Crossing reduction.
//!
//! An initial DFS order is refined by alternating down/up barycenter sweeps. The layering with
//! the fewest crossings wins; sweeping stops after four rounds without improvement.

use crate::LayoutGraph;
use rustc_hash::{FxHashMap, FxHashSet};

pub fn order(g: &mut LayoutGraph) {
    let mut layering = init_order(g);
    if layering.len() < 2 {
        assign_order(g, &layering);
        return;
    }

    let mut best = layering.clone();
    let mut best_cc = cross_count(g, &layering);

    let mut i = 0usize;
    let mut last_best = 0usize;
    while last_best < 4 && best_cc > 0.0 {
        sweep(g, &mut layering, i % 2 == 0, i % 4 >= 2);
        let cc = cross_count(g, &layering);
        if cc < best_cc {
            best_cc = cc;
            best = layering.clone();
            last_best = 0;
        } else {
            last_best += 1;
        }
        i += 1;
    }

    assign_order(g, &best);
}

fn assign_order(g: &mut LayoutGraph, layering: &[Vec<String>]) {
    for layer in layering {
        for (i, v) in layer.iter().enumerate() {
            if let Some(n) = g.node_mut(v) {
                n.order = Some(i);
            }
        }
    }
}

/// Depth-first placement: nodes are visited by increasing rank and each visit appends the node
/// to its rank, so connected nodes start out close together.
pub fn init_order(g: &LayoutGraph) -> Vec<Vec<String>> {
    let Some(max) = crate::util::max_rank(g) else {
        return Vec::new();
    };
    let mut layers: Vec<Vec<String>> = vec![Vec::new(); (max.max(0) + 1) as usize];

    let mut start: Vec<(i32, usize, &str)> = g
        .nodes()
        .enumerate()
        .filter_map(|(i, v)| g.node(v).and_then(|n| n.rank).map(|r| (r, i, v)))
        .collect();
    start.sort_by_key(|(r, i, _)| (*r, *i));

    let mut visited: FxHashSet<&str> = FxHashSet::default();
    for (_, _, root) in start {
        let mut stack = vec![root];
        while let Some(v) = stack.pop() {
            if !visited.insert(v) {
                continue;
            }
            if let Some(rank) = g.node(v).and_then(|n| n.rank) {
                if rank >= 0 {
                    layers[rank as usize].push(v.to_string());
                }
            }
            let mut next = g.successors(v);
            next.reverse();
            stack.extend(next);
        }
    }
    layers
}

fn sweep(g: &LayoutGraph, layering: &mut [Vec<String>], down: bool, bias_right: bool) {
    let n = layering.len();
    let ranks: Vec<usize> = if down {
        (1..n).collect()
    } else {
        (0..n - 1).rev().collect()
    };
    for r in ranks {
        let fixed = if down { r - 1 } else { r + 1 };
        let fixed_pos: FxHashMap<&str, usize> = layering[fixed]
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let sorted = sort_layer(g, &layering[r], &fixed_pos, down, bias_right);
        layering[r] = sorted;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Barycenter {
    pub v: String,
    pub barycenter: Option<f64>,
    pub weight: f64,
}

/// Weighted mean position of each node's neighbours in the fixed layer.
pub fn barycenters(
    g: &LayoutGraph,
    layer: &[String],
    fixed_pos: &FxHashMap<&str, usize>,
    use_predecessors: bool,
) -> Vec<Barycenter> {
    layer
        .iter()
        .map(|v| {
            let mut sum = 0.0;
            let mut weight = 0.0;
            let mut visit = |other: &str, w: f64| {
                if let Some(&pos) = fixed_pos.get(other) {
                    sum += w * pos as f64;
                    weight += w;
                }
            };
            if use_predecessors {
                g.for_each_in_edge(v, |e, label| visit(&e.v, label.weight));
            } else {
                g.for_each_out_edge(v, |e, label| visit(&e.w, label.weight));
            }
            Barycenter {
                v: v.clone(),
                barycenter: (weight > 0.0).then(|| sum / weight),
                weight,
            }
        })
        .collect()
}

/// Orders nodes with a barycenter by it; nodes without one keep their current index.
pub fn sort_layer(
    g: &LayoutGraph,
    layer: &[String],
    fixed_pos: &FxHashMap<&str, usize>,
    use_predecessors: bool,
    bias_right: bool,
) -> Vec<String> {
    let entries = barycenters(g, layer, fixed_pos, use_predecessors);

    let mut sortable: Vec<(usize, f64, String)> = Vec::new();
    let mut unsortable: Vec<(usize, String)> = Vec::new();
    for (i, e) in entries.into_iter().enumerate() {
        match e.barycenter {
            Some(bc) => sortable.push((i, bc, e.v)),
            None => unsortable.push((i, e.v)),
        }
    }

    sortable.sort_by(|a, b| {
        a.1.total_cmp(&b.1).then_with(|| {
            if bias_right {
                b.0.cmp(&a.0)
            } else {
                a.0.cmp(&b.0)
            }
        })
    });
    unsortable.reverse();

    fn drain_unsortable(out: &mut Vec<String>, unsortable: &mut Vec<(usize, String)>) {
        while unsortable.last().is_some_and(|(i, _)| *i <= out.len()) {
            if let Some((_, v)) = unsortable.pop() {
                out.push(v);
            }
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(layer.len());
    drain_unsortable(&mut out, &mut unsortable);
    for (_, _, v) in sortable {
        out.push(v);
        drain_unsortable(&mut out, &mut unsortable);
    }
    out.extend(unsortable.into_iter().rev().map(|(_, v)| v));
    out
}

/// Weighted number of edge crossings between every pair of adjacent ranks.
pub fn cross_count(g: &LayoutGraph, layering: &[Vec<String>]) -> f64 {
    let mut total = 0.0;
    for pair in layering.windows(2) {
        let north: FxHashMap<&str, usize> = pair[0]
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();
        let south: FxHashMap<&str, usize> = pair[1]
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i))
            .collect();

        let mut segments: Vec<(usize, usize, f64)> = Vec::new();
        for v in &pair[0] {
            g.for_each_out_edge(v, |e, label| {
                if let (Some(&a), Some(&b)) = (north.get(e.v.as_str()), south.get(e.w.as_str())) {
                    segments.push((a, b, label.weight));
                }
            });
        }
        segments.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.cmp(&y.1)));

        for i in 0..segments.len() {
            for j in (i + 1)..segments.len() {
                let (a1, b1, w1) = segments[i];
                let (a2, b2, w2) = segments[j];
                if a1 < a2 && b1 > b2 {
                    total += w1 * w2;
                }
            }
        }
    }
    total
}
