//! Prompt node fed by graph variables
//!
//! A prompt node accumulates variables from its inbound edges, renders its
//! `{{placeholder}}` template, and asks a completion backend for text. This
//! demo runs on the default [`EchoClient`], which returns the rendered
//! prompt itself, so the full busy → output cycle works offline.
//!
//! What this demo shows:
//! 1. Wiring variable edges into a prompt's named inputs
//! 2. Triggering a completion with an `invoke` edge
//! 3. The busy flag bracketing the call, then the `output` signal
//!
//! Running this demo:
//! ```bash
//! cargo run --example prompt_flow
//! ```
//!
//! Swap in a real backend by enabling the `openai` feature and configuring
//! [`OpenAiClient`] via `GraphRuntime::with_prompt_client`.
//!
//! [`EchoClient`]: breadboard::llm::EchoClient
//! [`OpenAiClient`]: breadboard::llm::openai::OpenAiClient

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
    info!("=== prompt_flow: template variables in, completed text out ===");

    let board = Arc::new(MockBoard::new());
    let handle = GraphRuntime::new(board).start();
    let mut updates = handle.subscribe();

    let nodes = vec![
        NodeDescriptor::new("subject", "bridge"),
        NodeDescriptor::new("style", "bridge"),
        NodeDescriptor::new("go", "bridge"),
        NodeDescriptor::new("poet", "prompt")
            .with_config("template", serde_json::json!("Write {{style}} about {{subject}}.")),
    ];
    let edges = vec![
        EdgeDescriptor::new("e1", "subject", "change", "poet", "subject"),
        EdgeDescriptor::new("e2", "style", "change", "poet", "style"),
        EdgeDescriptor::new("e3", "go", "subscribe", "poet", "invoke"),
    ];
    handle.send(HostCommand::flow(nodes, edges))?;

    // Fill the variables, then pull the trigger.
    handle.send(HostCommand::set_external("subject", serde_json::json!("a soldering iron")))?;
    handle.send(HostCommand::set_external("style", serde_json::json!("a limerick")))?;
    handle.send(HostCommand::set_external("go", serde_json::json!(true)))?;

    info!("--- update stream ---");
    while let Some(update) = updates.next_timeout(Duration::from_millis(500)).await {
        info!("  {update}");
    }

    handle.shutdown().await?;
    info!("done");
    Ok(())
}
