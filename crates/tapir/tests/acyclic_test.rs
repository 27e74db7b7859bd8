use tapir::graphlib::{Graph, GraphOptions, alg};
use tapir::{LayoutGraph, acyclic};

fn multigraph() -> LayoutGraph {
    Graph::new(GraphOptions { multigraph: true })
}

#[test]
fn dfs_fas_is_empty_for_a_dag() {
    let mut g = multigraph();
    g.set_edge("a", "b");
    g.set_edge("b", "c");
    g.set_edge("a", "c");
    assert!(acyclic::dfs_fas(&g).is_empty());
}

#[test]
fn run_breaks_every_cycle_and_undo_restores_edges() {
    let mut g = multigraph();
    for (v, w) in [("a", "b"), ("b", "c"), ("c", "a")] {
        g.set_edge(v, w);
    }
    g.set_edge("c", "d");
    let before = g.edge_keys();

    acyclic::run(&mut g);
    assert!(alg::topsort(&g).is_ok());
    assert!(g.edges().any(|e| e.name.as_deref() == Some("rev1")));

    acyclic::undo(&mut g);
    let mut after = g.edge_keys();
    let mut expected = before;
    after.sort();
    expected.sort();
    assert_eq!(after, expected);
    assert!(g.edges().all(|e| !g.edge_by_key(e).unwrap().reversed));
}

#[test]
fn run_keeps_opposite_edges_apart() {
    let mut g = multigraph();
    g.set_edge("a", "b");
    g.set_edge("b", "a");

    acyclic::run(&mut g);

    assert_eq!(g.edge_count(), 2);
    assert!(g.has_edge("a", "b", None));
    assert!(g.has_edge("a", "b", Some("rev1")));
}

#[test]
fn self_loops_are_not_reversed() {
    let mut g = multigraph();
    g.set_edge("a", "a");
    acyclic::run(&mut g);
    assert!(g.has_edge("a", "a", None));
}
