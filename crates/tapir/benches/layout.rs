use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tapir::graphlib::Graph;
use tapir::{GraphLabel, LayoutGraph, NodeLabel, RankDir, layout};

/// A stack of `depth` stages, each fanning out to `width` parallel branches that merge again.
fn branched_network(depth: usize, width: usize) -> LayoutGraph {
    let mut g: LayoutGraph = Graph::default();
    g.set_graph(GraphLabel {
        rankdir: RankDir::LR,
        nodesep: 150.0,
        ranksep: 100.0,
        ..Default::default()
    });

    let mut prev = "input".to_string();
    g.set_node(prev.as_str(), NodeLabel::sized(240.0, 120.0));
    for d in 0..depth {
        let merge = format!("merge{d}");
        g.set_node(merge.as_str(), NodeLabel::sized(240.0, 140.0));
        for w in 0..width {
            let id = format!("s{d}_b{w}");
            g.set_node(id.as_str(), NodeLabel::sized(240.0, 120.0));
            g.set_edge(prev.as_str(), id.as_str());
            g.set_edge(id.as_str(), merge.as_str());
        }
        if d % 3 == 2 {
            g.set_edge("input", merge.as_str());
        }
        prev = merge;
    }
    g
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for (depth, width) in [(4, 2), (16, 4), (48, 6)] {
        let g = branched_network(depth, width);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{depth}x{width}")),
            &g,
            |b, g| {
                b.iter_batched(
                    || g.clone(),
                    |mut g| {
                        layout(&mut g);
                        black_box(g.graph().width)
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
