use crate::graphlib::{EdgeKey, GraphOptions};
use crate::{
    EdgeLabel, LayoutGraph, NodeLabel, Point, acyclic, coordinate_system, normalize, order,
    position, rank, util,
};

/// Lays out `g` in place.
///
/// Node labels receive center coordinates, rank and order; edge labels receive a polyline that
/// starts and ends on the boundary of the endpoint boxes. The graph label receives the overall
/// width and height. The input graph is left structurally untouched.
pub fn layout(g: &mut LayoutGraph) {
    let mut lg = build_layout_graph(g);
    run_layout(&mut lg);
    update_input_graph(g, &lg);
}

fn build_layout_graph(input: &LayoutGraph) -> LayoutGraph {
    let mut lg = LayoutGraph::new(GraphOptions { multigraph: true });
    let mut graph = input.graph().clone();
    graph.dummy_chains.clear();
    lg.set_graph(graph);

    for v in input.nodes() {
        let Some(n) = input.node(v) else { continue };
        lg.set_node(v, NodeLabel::sized(n.width, n.height));
    }
    for e in input.edges() {
        if e.is_self_loop() {
            continue;
        }
        let Some(label) = input.edge_by_key(e) else {
            continue;
        };
        lg.set_edge_named(
            e.v.as_str(),
            e.w.as_str(),
            e.name.clone(),
            Some(EdgeLabel {
                minlen: label.minlen.max(1),
                weight: label.weight,
                ..Default::default()
            }),
        );
    }
    lg
}

fn run_layout(g: &mut LayoutGraph) {
    acyclic::run(g);
    rank::longest_path(g);
    rank::normalize_ranks(g);
    normalize::run(g);
    order::order(g);
    coordinate_system::adjust(g);
    position::position(g);
    normalize::undo(g);
    coordinate_system::undo(g);
    util::translate_graph(g);
    util::assign_node_intersects(g);
    acyclic::undo(g);
}

fn update_input_graph(input: &mut LayoutGraph, lg: &LayoutGraph) {
    input.for_each_node_mut(|id, n| {
        if let Some(layout) = lg.node(id) {
            n.x = layout.x;
            n.y = layout.y;
            n.rank = layout.rank;
            n.order = layout.order;
        }
    });

    let nodesep = lg.graph().nodesep;
    let self_loops: Vec<(EdgeKey, Vec<Point>)> = input
        .edges()
        .filter(|e| e.is_self_loop())
        .filter_map(|e| lg.node(&e.v).map(|n| (e.clone(), self_loop_points(n, nodesep))))
        .collect();

    input.for_each_edge_mut(|e, label| {
        if let Some(layout) = lg.edge_by_key(e) {
            label.points = layout.points.clone();
        }
    });
    for (e, points) in self_loops {
        if let Some(label) = input.edge_mut_by_key(&e) {
            label.points = points;
        }
    }

    let (width, height) = (lg.graph().width, lg.graph().height);
    let graph = input.graph_mut();
    graph.width = width;
    graph.height = height;
}

/// A small loop hanging off the right side of the node.
fn self_loop_points(n: &NodeLabel, nodesep: f64) -> Vec<Point> {
    let x = n.x.unwrap_or(0.0) + n.width / 2.0;
    let y = n.y.unwrap_or(0.0);
    let dx = nodesep / 2.0;
    let dy = n.height / 4.0;
    vec![
        Point::new(x, y - dy),
        Point::new(x + dx, y - dy),
        Point::new(x + dx, y + dy),
        Point::new(x, y + dy),
    ]
}
