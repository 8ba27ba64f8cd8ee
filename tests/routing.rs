//! Edge dispatch through the live runtime: aggregation, prompt variable
//! maps and the ways a graph can be mis-wired without breaking anything.

mod common;
use common::*;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use breadboard::hal::MockBoard;
use breadboard::host::UpdateBus;
use breadboard::llm::{PromptClient, PromptError};
use breadboard::runtime::GraphRuntime;
use breadboard::value::Value;

#[tokio::test]
async fn and_gate_tracks_every_input() {
    let mut rig = rig();
    rig.flow(
        vec![
            node("a", "bridge"),
            node("b", "bridge"),
            node("g", "gate").with_config("gate", serde_json::json!("and")),
        ],
        vec![
            edge("e1", "a", "change", "g", "in"),
            edge("e2", "b", "change", "g", "in"),
        ],
    );

    rig.set_external("a", serde_json::json!(true));
    assert_eq!(rig.await_action("g", "false").await, Value::Bool(false));

    rig.set_external("b", serde_json::json!(true));
    assert_eq!(rig.await_action("g", "true").await, Value::Bool(true));

    rig.set_external("a", serde_json::json!(false));
    assert_eq!(rig.await_action("g", "false").await, Value::Bool(false));
}

/// Client that records every prompt it is asked to complete.
#[derive(Clone, Default)]
struct CapturingClient {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PromptClient for CapturingClient {
    async fn complete(&self, prompt: &str) -> Result<String, PromptError> {
        self.seen.lock().unwrap().push(prompt.to_string());
        Ok(format!("reply: {prompt}"))
    }
}

fn prompt_rig(client: CapturingClient) -> TestRig {
    let board = Arc::new(MockBoard::new());
    let sink = breadboard::host::MemorySink::new();
    let bus = UpdateBus::with_capacity(512);
    bus.add_sink(sink.clone());
    let handle = GraphRuntime::new(board.clone())
        .with_prompt_client(Arc::new(client))
        .with_bus(bus)
        .start();
    let updates = handle.subscribe();
    TestRig {
        board,
        handle,
        updates,
        sink,
    }
}

#[tokio::test]
async fn prompt_invocation_gathers_variables_from_inbound_edges() {
    let client = CapturingClient::default();
    let mut rig = prompt_rig(client.clone());
    rig.flow(
        vec![
            node("who", "bridge"),
            node("style", "bridge"),
            node("go", "bridge"),
            node("p", "prompt")
                .with_config("template", serde_json::json!("Write {{style}} about {{who}}")),
        ],
        vec![
            edge("e1", "who", "change", "p", "who"),
            edge("e2", "style", "change", "p", "style"),
            edge("e3", "go", "subscribe", "p", "invoke"),
        ],
    );

    rig.set_external("who", serde_json::json!("Ada"));
    rig.set_external("style", serde_json::json!("a haiku"));
    rig.settle().await;

    rig.set_external("go", serde_json::json!(true));
    assert_eq!(
        rig.await_action("p", "output").await,
        Value::Text("reply: Write a haiku about Ada".into())
    );
    assert_eq!(
        client.seen.lock().unwrap().as_slice(),
        ["Write a haiku about Ada"]
    );
}

#[tokio::test]
async fn colliding_prompt_handles_concatenate_in_edge_order() {
    let client = CapturingClient::default();
    let mut rig = prompt_rig(client.clone());
    rig.flow(
        vec![
            node("first", "bridge"),
            node("second", "bridge"),
            node("go", "bridge"),
            node("p", "prompt").with_config("template", serde_json::json!("Guests: {{who}}")),
        ],
        vec![
            edge("e1", "first", "change", "p", "who"),
            edge("e2", "second", "change", "p", "who"),
            edge("e3", "go", "subscribe", "p", "invoke"),
        ],
    );

    rig.set_external("first", serde_json::json!("Ada"));
    rig.set_external("second", serde_json::json!("Grace"));
    rig.settle().await;

    rig.set_external("go", serde_json::json!(true));
    rig.await_action("p", "output").await;
    assert_eq!(
        client.seen.lock().unwrap().as_slice(),
        ["Guests: Ada, Grace"]
    );
}

#[tokio::test]
async fn dangling_edges_never_surface_errors() {
    let mut rig = rig();
    rig.flow(
        vec![node("b", "bridge"), node("c", "counter")],
        vec![
            edge("e1", "b", "subscribe", "ghost", "in"),
            edge("e2", "ghost", "change", "c", "increment"),
            edge("e3", "b", "subscribe", "c", "increment"),
        ],
    );

    rig.set_external("b", serde_json::json!(3));
    assert_eq!(rig.await_action("c", "change").await, Value::Number(3.0));

    rig.quiesce().await;
    let seen = rig.sink.snapshot();
    assert!(
        seen.iter().all(|u| !u.is_error()),
        "dangling edges should be silent, got: {seen:?}"
    );
    // Only the live edge produced a traversal.
    assert_eq!(traversals(&seen), vec![("e3".to_string(), "subscribe".to_string())]);
}

#[tokio::test]
async fn unknown_target_action_suppresses_the_traversal() {
    let mut rig = rig();
    rig.flow(
        vec![node("b", "bridge"), node("c", "counter")],
        vec![
            edge("e1", "b", "subscribe", "c", "defragment"),
            edge("e2", "b", "subscribe", "c", "increment"),
        ],
    );

    rig.set_external("b", serde_json::json!(1));
    rig.await_action("c", "change").await;
    rig.quiesce().await;

    assert_eq!(
        traversals(&rig.sink.snapshot()),
        vec![("e2".to_string(), "subscribe".to_string())]
    );
}
