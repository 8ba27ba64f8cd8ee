//! Benchmarks for full-graph rebuild.
//!
//! Every `flow` command tears the old graph down and instantiates the new
//! one from scratch; editors send one on each structural change, so the
//! rebuild has to stay comfortably interactive at a few hundred nodes.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;

use breadboard::descriptor::{EdgeDescriptor, NodeDescriptor};
use breadboard::hal::MockBoard;
use breadboard::host::UpdateBus;
use breadboard::protocol::{HostCommand, Update};
use breadboard::runtime::GraphRuntime;

const GRAPH_SIZES: &[usize] = &[10, 100, 500];

/// A chain of counters plus a bridge marker node. The marker push coming
/// back out is the proof the rebuild completed.
fn chain_snapshot(node_count: usize) -> (Vec<NodeDescriptor>, Vec<EdgeDescriptor>) {
    let mut nodes = Vec::with_capacity(node_count + 1);
    let mut edges = Vec::with_capacity(node_count);
    for i in 0..node_count {
        nodes.push(NodeDescriptor::new(format!("n{i}"), "counter"));
        if i > 0 {
            edges.push(EdgeDescriptor::new(
                format!("e{i}"),
                format!("n{}", i - 1),
                "change",
                format!("n{i}"),
                "increment",
            ));
        }
    }
    nodes.push(NodeDescriptor::new("marker", "bridge"));
    (nodes, edges)
}

async fn rebuild_round_trip(nodes: Vec<NodeDescriptor>, edges: Vec<EdgeDescriptor>) {
    let board = Arc::new(MockBoard::new());
    let handle = GraphRuntime::new(board)
        .with_bus(UpdateBus::with_capacity(1024))
        .start();
    let mut updates = handle.subscribe();

    handle.send(HostCommand::flow(nodes, edges)).expect("flow");
    handle
        .send(HostCommand::set_external("marker", serde_json::json!("built")))
        .expect("marker push");

    loop {
        let update = updates
            .next_timeout(std::time::Duration::from_secs(5))
            .await
            .expect("rebuild stalled");
        if let Update::Node(n) = update
            && n.node_id == "marker"
        {
            break;
        }
    }
    handle.shutdown().await.expect("shutdown");
}

fn graph_build(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("graph_build");

    for &size in GRAPH_SIZES {
        let snapshot = chain_snapshot(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &snapshot,
            |b, (nodes, edges)| {
                b.to_async(&runtime)
                    .iter(|| rebuild_round_trip(nodes.clone(), edges.clone()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, graph_build);
criterion_main!(benches);
