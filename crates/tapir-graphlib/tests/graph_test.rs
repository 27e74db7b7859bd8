use pretty_assertions::assert_eq;
use tapir_graphlib::{EdgeKey, Graph, GraphOptions, alg};

fn chain<N, E, G>(g: &mut Graph<N, E, G>, ids: &[&str])
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    for pair in ids.windows(2) {
        g.set_edge(pair[0], pair[1]);
    }
}

#[test]
fn nodes_and_edges_keep_insertion_order() {
    let mut g: Graph<i32, (), ()> = Graph::default();
    g.set_node("c", 3);
    g.set_node("a", 1);
    g.set_edge("a", "b");
    g.set_node("c", 30);

    assert_eq!(g.node_ids(), vec!["c", "a", "b"]);
    assert_eq!(g.node("c"), Some(&30));
    assert_eq!(g.node("b"), Some(&0));
    assert_eq!(g.edge_count(), 1);
}

#[test]
fn simple_graph_ignores_edge_names() {
    let mut g: Graph<(), i32, ()> = Graph::default();
    g.set_edge_named("a", "b", Some("x"), Some(1));
    g.set_edge_named("a", "b", Some("y"), Some(2));

    assert_eq!(g.edge_count(), 1);
    assert_eq!(g.edge("a", "b", Some("whatever")), Some(&2));
}

#[test]
fn multigraph_keeps_named_parallel_edges() {
    let mut g: Graph<(), i32, ()> = Graph::new(GraphOptions { multigraph: true });
    g.set_edge_with_label("a", "b", 1);
    g.set_edge_named("a", "b", Some("rev"), Some(2));

    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.edge("a", "b", None), Some(&1));
    assert_eq!(g.edge("a", "b", Some("rev")), Some(&2));
    assert_eq!(g.successors("a"), vec!["b"]);
    assert_eq!(g.out_edges("a", Some("b")).len(), 2);
}

#[test]
fn remove_node_drops_incident_edges_and_reindexes() {
    let mut g: Graph<(), (), ()> = Graph::default();
    chain(&mut g, &["a", "b", "c", "d"]);

    assert!(g.remove_node("b"));
    assert!(!g.remove_node("b"));
    assert_eq!(g.node_ids(), vec!["a", "c", "d"]);
    assert_eq!(
        g.edge_keys(),
        vec![EdgeKey::new("c", "d", None::<String>)]
    );
    assert_eq!(g.predecessors("d"), vec!["c"]);
    assert!(g.successors("a").is_empty());
}

#[test]
fn remove_edge_returns_label() {
    let mut g: Graph<(), &'static str, ()> = Graph::default();
    g.set_edge_with_label("a", "b", "ab");
    g.set_edge_with_label("b", "c", "bc");

    assert_eq!(g.remove_edge("a", "b", None), Some("ab"));
    assert_eq!(g.remove_edge("a", "b", None), None);
    assert_eq!(g.predecessors("c"), vec!["b"]);
    assert_eq!(g.sources(), vec!["a", "b"]);
}

#[test]
fn unlabelled_edges_get_the_default_label() {
    let mut g: Graph<(), u32, ()> = Graph::default();
    g.ensure_node("z");
    g.set_edge("a", "b");
    assert_eq!(g.edge("a", "b", None), Some(&0));
    assert_eq!(g.node_ids(), vec!["z", "a", "b"]);
}

#[test]
fn topsort_orders_dag_and_reports_cycles() {
    let mut g: Graph<(), (), ()> = Graph::default();
    chain(&mut g, &["a", "b", "d"]);
    chain(&mut g, &["a", "c", "d"]);
    assert_eq!(alg::topsort(&g), Ok(vec!["a".into(), "b".into(), "c".into(), "d".into()]));

    g.set_edge("d", "a");
    let err = alg::topsort(&g).unwrap_err();
    assert_eq!(err.remaining.len(), 4);
}
