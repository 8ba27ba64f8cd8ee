use std::sync::Arc;
use std::time::Duration;

use breadboard::descriptor::{EdgeDescriptor, NodeDescriptor};
use breadboard::hal::MockBoard;
use breadboard::host::{MemorySink, UpdateBus, UpdateStream};
use breadboard::protocol::{HostCommand, Update};
use breadboard::runtime::{GraphRuntime, RuntimeHandle};
use breadboard::value::Value;

/// Generous upper bound for an update that should arrive "immediately".
pub const UPDATE_TIMEOUT: Duration = Duration::from_millis(500);

/// A running runtime on a mock board, with both a live subscriber and a
/// recording sink attached.
pub struct TestRig {
    pub board: Arc<MockBoard>,
    pub handle: RuntimeHandle,
    pub updates: UpdateStream,
    pub sink: MemorySink,
}

pub fn rig() -> TestRig {
    let board = Arc::new(MockBoard::new());
    let sink = MemorySink::new();
    let bus = UpdateBus::with_capacity(512);
    bus.add_sink(sink.clone());
    let handle = GraphRuntime::new(board.clone()).with_bus(bus).start();
    let updates = handle.subscribe();
    TestRig {
        board,
        handle,
        updates,
        sink,
    }
}

pub fn node(id: &str, kind: &str) -> NodeDescriptor {
    NodeDescriptor::new(id, kind)
}

pub fn pin_node(id: &str, kind: &str, pin: u16) -> NodeDescriptor {
    NodeDescriptor::new(id, kind).with_config("pin", serde_json::json!(pin))
}

pub fn edge(id: &str, source: &str, signal: &str, target: &str, action: &str) -> EdgeDescriptor {
    EdgeDescriptor::new(id, source, signal, target, action)
}

impl TestRig {
    pub fn flow(&self, nodes: Vec<NodeDescriptor>, edges: Vec<EdgeDescriptor>) {
        self.handle.send(HostCommand::flow(nodes, edges)).unwrap();
    }

    pub fn set_external(&self, node_id: &str, value: serde_json::Value) {
        self.handle
            .send(HostCommand::set_external(node_id, value))
            .unwrap();
    }

    /// Next node update as a `(node, action, value)` triple; panics on
    /// timeout. Error and board updates are skipped.
    pub async fn next_node(&mut self) -> (String, String, Value) {
        loop {
            let update = self
                .updates
                .next_timeout(UPDATE_TIMEOUT)
                .await
                .expect("expected a node update before the timeout");
            if let Update::Node(n) = update {
                return (n.node_id, n.action, n.value);
            }
        }
    }

    /// Skip forward until `node` reports `action`; returns its value.
    pub async fn await_action(&mut self, node: &str, action: &str) -> Value {
        loop {
            let (n, a, v) = self.next_node().await;
            if n == node && a == action {
                return v;
            }
        }
    }

    /// Next error update, skipping node and board traffic.
    pub async fn next_error(&mut self) -> breadboard::protocol::ErrorReport {
        loop {
            let update = self
                .updates
                .next_timeout(UPDATE_TIMEOUT)
                .await
                .expect("expected an error update before the timeout");
            if let Update::Error(report) = update {
                return report;
            }
        }
    }

    /// Block until the board has at least `count` active watch registrations.
    pub async fn await_watches(&self, count: usize) {
        for _ in 0..100 {
            if self.board.watched().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "board never reached {count} watches; has {:?}",
            self.board.watched()
        );
    }

    /// Wait until the update stream goes quiet.
    pub async fn quiesce(&mut self) {
        while self
            .updates
            .next_timeout(Duration::from_millis(50))
            .await
            .is_some()
        {}
    }

    /// Let queued envelopes drain, then forget everything seen so far.
    pub async fn settle(&mut self) {
        self.quiesce().await;
        self.sink.clear();
    }
}
