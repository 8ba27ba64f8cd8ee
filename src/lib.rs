//! # Breadboard: Live Dataflow Runtime for Hardware Prototyping Graphs
//!
//! Breadboard executes visual node-programming graphs against a physical
//! controller board. A host editor streams graph snapshots and external
//! values in; the runtime streams `{nodeId, action, value}` updates and
//! structured error reports back out, NDJSON on stdout by default.
//!
//! ## Core Concepts
//!
//! - **Components**: Live node instances with one current [`value`], change
//!   detection and named signal emission
//! - **Kinds**: The built-in component vocabulary (sensors, actuators,
//!   logic, timing, an LLM prompt node)
//! - **Edges**: Source signal to target action wiring, re-resolved from the
//!   edge list on every emission
//! - **Epochs**: Every graph rebuild advances a fence; stale envelopes from
//!   the previous graph are dropped on arrival
//! - **Nothing fatal**: Bad descriptors, bad payloads and driver failures
//!   become error updates, never runtime crashes
//!
//! [`value`]: component::Component::value
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use breadboard::descriptor::{EdgeDescriptor, NodeDescriptor};
//! use breadboard::hal::MockBoard;
//! use breadboard::protocol::HostCommand;
//! use breadboard::runtime::GraphRuntime;
//!
//! # async fn example() -> Result<(), breadboard::runtime::RuntimeError> {
//! let board = Arc::new(MockBoard::new());
//! let handle = GraphRuntime::new(board.clone()).start();
//!
//! // Wire a button to an LED and push the graph in.
//! let nodes = vec![
//!     NodeDescriptor::new("btn", "button").with_config("pin", serde_json::json!(2)),
//!     NodeDescriptor::new("led", "led").with_config("pin", serde_json::json!(13)),
//! ];
//! let edges = vec![EdgeDescriptor::new("e1", "btn", "down", "led", "toggle")];
//! handle.send(HostCommand::flow(nodes, edges))?;
//!
//! // Press the (mock) button and watch updates stream out.
//! let mut updates = handle.subscribe();
//! board.inject_digital(2, true);
//! while let Some(update) = updates.next_timeout(Duration::from_millis(250)).await {
//!     println!("{update}");
//! }
//!
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`runtime`] - The event loop, graph construction and configuration
//! - [`component`] - The `Component` trait, value cells and emission plumbing
//! - [`kinds`] - Built-in component implementations
//! - [`registry`] - Kind-name-to-factory lookup, extensible with custom kinds
//! - [`protocol`] - Host wire types: inbound commands, outbound updates
//! - [`descriptor`] - Node and edge descriptors as the host serializes them
//! - [`hal`] - Board driver abstraction and the in-process mock board
//! - [`host`] - Outbound update bus, sinks and subscriber streams
//! - [`llm`] - Prompt completion clients for the `prompt` kind
//! - [`value`] - The dynamic value type flowing along edges
//! - [`telemetry`] - Tracing bootstrap for binaries and demos

pub mod component;
pub mod descriptor;
pub mod hal;
pub mod host;
pub mod kinds;
pub mod llm;
pub mod protocol;
pub mod registry;
mod router;
pub mod runtime;
pub mod telemetry;
pub mod value;
