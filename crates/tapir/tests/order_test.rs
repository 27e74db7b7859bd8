use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;
use tapir::graphlib::Graph;
use tapir::util::build_layer_matrix;
use tapir::{LayoutGraph, NodeLabel, order};

fn ranked(nodes: &[(&str, i32)]) -> LayoutGraph {
    let mut g: LayoutGraph = Graph::default();
    for (id, rank) in nodes {
        g.set_node(
            *id,
            NodeLabel {
                rank: Some(*rank),
                ..Default::default()
            },
        );
    }
    g
}

fn layers(v: &[&[&str]]) -> Vec<Vec<String>> {
    v.iter()
        .map(|l| l.iter().map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn cross_count_counts_inversions_between_ranks() {
    let mut g = ranked(&[("a", 0), ("b", 0), ("c", 1), ("d", 1)]);
    g.set_edge("a", "d");
    g.set_edge("b", "c");

    assert_eq!(order::cross_count(&g, &layers(&[&["a", "b"], &["c", "d"]])), 1.0);
    assert_eq!(order::cross_count(&g, &layers(&[&["a", "b"], &["d", "c"]])), 0.0);
}

#[test]
fn order_removes_avoidable_crossings() {
    let mut g = ranked(&[("a", 0), ("b", 0), ("c", 1), ("d", 1)]);
    g.set_edge("a", "d");
    g.set_edge("b", "c");
    g.set_edge("a", "x");
    g.node_mut("x").unwrap().rank = Some(1);

    order::order(&mut g);

    let layering = build_layer_matrix(&g);
    assert_eq!(order::cross_count(&g, &layering), 0.0);
    for layer in &layering {
        let mut orders: Vec<usize> = layer
            .iter()
            .map(|v| g.node(v).unwrap().order.unwrap())
            .collect();
        orders.sort();
        assert_eq!(orders, (0..layer.len()).collect::<Vec<_>>());
    }
}

#[test]
fn init_order_places_each_node_once_on_its_rank() {
    let mut g = ranked(&[("a", 0), ("b", 1), ("c", 1), ("d", 2)]);
    g.set_edge("a", "c");
    g.set_edge("a", "b");
    g.set_edge("b", "d");

    assert_eq!(
        order::init_order(&g),
        layers(&[&["a"], &["c", "b"], &["d"]])
    );
}

#[test]
fn sort_layer_keeps_unconnected_nodes_in_place() {
    let mut g = ranked(&[("n1", 0), ("n2", 0), ("s1", 1), ("s2", 1), ("s3", 1)]);
    g.set_edge("n2", "s1");
    g.set_edge("n1", "s3");

    let fixed: FxHashMap<&str, usize> = [("n1", 0), ("n2", 1)].into_iter().collect();
    let layer = layers(&[&["s1", "s2", "s3"]]).remove(0);

    assert_eq!(
        order::sort_layer(&g, &layer, &fixed, true, false),
        vec!["s3", "s2", "s1"]
    );
}
