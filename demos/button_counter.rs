//! Button → Counter → LED
//!
//! The smallest useful breadboard graph: a push button increments a counter
//! and the count drives an LED's brightness. Everything runs against the
//! in-process [`MockBoard`], so no hardware is needed.
//!
//! What this demo shows:
//! 1. Starting a [`GraphRuntime`] and pushing a graph snapshot in
//! 2. Driving pin events through the mock board
//! 3. Watching the `{nodeId, action, value}` update stream
//! 4. The commands the actuator layer sent to the board
//!
//! Running this demo:
//! ```bash
//! cargo run --example button_counter
//! ```

use std::sync::Arc;
use std::time::Duration;

use miette::Result;
use tracing::info;

use breadboard::descriptor::{EdgeDescriptor, NodeDescriptor};
use breadboard::hal::MockBoard;
use breadboard::protocol::HostCommand;
use breadboard::runtime::GraphRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    breadboard::telemetry::init_with_filter("info");
    breadboard::telemetry::init_panic_reporting();
    demo().await
}

async fn demo() -> Result<()> {
    info!("=== button_counter: press a mock button, watch the graph react ===");

    let board = Arc::new(MockBoard::new());
    let handle = GraphRuntime::new(board.clone()).start();
    let mut updates = handle.subscribe();

    let nodes = vec![
        NodeDescriptor::new("btn", "button").with_config("pin", serde_json::json!(2)),
        NodeDescriptor::new("ctr", "counter"),
        NodeDescriptor::new("led", "led").with_config("pin", serde_json::json!(9)),
    ];
    let edges = vec![
        EdgeDescriptor::new("e1", "btn", "down", "ctr", "increment"),
        EdgeDescriptor::new("e2", "ctr", "change", "led", "brightness"),
    ];
    handle.send(HostCommand::flow(nodes, edges))?;

    // Three presses: each one is a down edge followed by a release.
    for press in 1..=3u8 {
        info!(press, "pressing the button");
        board.inject_digital(2, true);
        board.inject_digital(2, false);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    info!("--- update stream ---");
    while let Some(update) = updates.next_timeout(Duration::from_millis(250)).await {
        info!("  {update}");
    }

    info!("--- board commands ---");
    for command in board.commands() {
        info!("  {command:?}");
    }

    handle.shutdown().await?;
    info!("done");
    Ok(())
}
