//! Host protocol: inbound commands and outbound updates.
//!
//! The runtime exchanges exactly two inbound shapes with its host — a full
//! graph snapshot and an external value push — and posts node events,
//! structured errors, and board lifecycle notices back out. Outbound updates
//! are the sole channel by which the host (editor UI, bridges, loggers)
//! observes runtime state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::descriptor::{EdgeDescriptor, NodeDescriptor};
use crate::value::Value;

// =============================================================================
// Inbound
// =============================================================================

/// A command sent by the host, tagged with `type` on the wire.
///
/// Unknown types are a protocol error: reported on the update channel, then
/// ignored. Parsing raw host input happens in the runtime so the report can
/// be posted from there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostCommand {
    /// Full graph snapshot: tear everything down, rebuild from scratch.
    Flow {
        #[serde(default)]
        nodes: Vec<NodeDescriptor>,
        #[serde(default)]
        edges: Vec<EdgeDescriptor>,
    },
    /// Push a value into one component from an outside system.
    #[serde(rename_all = "camelCase")]
    SetExternal {
        node_id: String,
        value: serde_json::Value,
    },
}

impl HostCommand {
    pub fn flow(nodes: Vec<NodeDescriptor>, edges: Vec<EdgeDescriptor>) -> Self {
        HostCommand::Flow { nodes, edges }
    }

    pub fn set_external(node_id: impl Into<String>, value: serde_json::Value) -> Self {
        HostCommand::SetExternal {
            node_id: node_id.into(),
            value,
        }
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// One outbound notification to the host.
#[derive(Debug, Clone)]
pub enum Update {
    /// `{ nodeId, action, value }`, plus `edgeId` for traversal bookkeeping.
    Node(NodeUpdate),
    /// `{ type: "error", message, nodeId?, node? }`.
    Error(ErrorReport),
    /// Board lifecycle forwarded from the driver layer.
    Board(BoardNotice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeUpdate {
    pub node_id: String,
    pub action: String,
    pub value: Value,
    /// Set on traversal bookkeeping updates so the host can animate the edge.
    pub edge_id: Option<String>,
}

/// Structured error surfaced to the host: protocol errors, node construction
/// failures, per-call coercion failures. Never fatal to the runtime.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub node_id: Option<String>,
    /// The failing descriptor, attached for construction errors.
    pub node: Option<NodeDescriptor>,
    pub when: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardNotice {
    Ready,
    Close,
    Exit,
}

impl Update {
    pub fn node(node_id: impl Into<String>, action: impl Into<String>, value: Value) -> Self {
        Update::Node(NodeUpdate {
            node_id: node_id.into(),
            action: action.into(),
            value,
            edge_id: None,
        })
    }

    pub fn traversal(
        node_id: impl Into<String>,
        action: impl Into<String>,
        value: Value,
        edge_id: impl Into<String>,
    ) -> Self {
        Update::Node(NodeUpdate {
            node_id: node_id.into(),
            action: action.into(),
            value,
            edge_id: Some(edge_id.into()),
        })
    }

    pub fn error(report: ErrorReport) -> Self {
        Update::Error(report)
    }

    /// Node id this update concerns, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Update::Node(n) => Some(&n.node_id),
            Update::Error(e) => e.node_id.as_deref(),
            Update::Board(_) => None,
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            Update::Node(n) => Some(&n.action),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Update::Error(_))
    }

    /// Wire rendering per the host protocol.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Update::Node(n) => {
                let mut out = json!({
                    "nodeId": n.node_id,
                    "action": n.action,
                    "value": n.value.to_json(),
                });
                if let Some(edge) = &n.edge_id {
                    out["edgeId"] = json!(edge);
                }
                out
            }
            Update::Error(e) => {
                let mut out = json!({
                    "type": "error",
                    "message": e.message,
                });
                if let Some(id) = &e.node_id {
                    out["nodeId"] = json!(id);
                }
                if let Some(node) = &e.node {
                    out["node"] = serde_json::to_value(node).unwrap_or(serde_json::Value::Null);
                }
                out
            }
            Update::Board(notice) => json!({
                "type": "board",
                "state": notice.label(),
            }),
        }
    }
}

impl ErrorReport {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            node_id: None,
            node: None,
            when: Utc::now(),
        }
    }

    /// Unknown inbound message type or malformed input.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    /// Driver-level failure with no owning node.
    pub fn board(message: impl Into<String>) -> Self {
        Self::new(message)
    }

    /// A live component failed mid-call (coercion and friends).
    pub fn node(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            ..Self::new(message)
        }
    }

    /// A descriptor could not be built; carries the descriptor itself.
    pub fn construction(descriptor: NodeDescriptor, message: impl Into<String>) -> Self {
        Self {
            node_id: Some(descriptor.id.clone()),
            node: Some(descriptor),
            ..Self::new(message)
        }
    }
}

impl BoardNotice {
    pub fn label(&self) -> &'static str {
        match self {
            BoardNotice::Ready => "ready",
            BoardNotice::Close => "close",
            BoardNotice::Exit => "exit",
        }
    }
}

impl std::fmt::Display for Update {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Node(n) => {
                write!(f, "{}/{} = {}", n.node_id, n.action, n.value)?;
                if let Some(edge) = &n.edge_id {
                    write!(f, " (edge {edge})")?;
                }
                Ok(())
            }
            Update::Error(e) => {
                write!(f, "error: {}", e.message)?;
                if let Some(id) = &e.node_id {
                    write!(f, " (node {id})")?;
                }
                Ok(())
            }
            Update::Board(notice) => write!(f, "board: {}", notice.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_command_parses() {
        let raw = serde_json::json!({
            "type": "flow",
            "nodes": [{ "id": "a", "kind": "counter" }],
            "edges": [{
                "id": "e1",
                "sourceId": "a", "sourceHandle": "change",
                "targetId": "b", "targetHandle": "from"
            }]
        });
        let cmd: HostCommand = serde_json::from_value(raw).unwrap();
        match cmd {
            HostCommand::Flow { nodes, edges } => {
                assert_eq!(nodes.len(), 1);
                assert_eq!(edges[0].source_handle, "change");
            }
            other => panic!("expected flow, got {other:?}"),
        }
    }

    #[test]
    fn set_external_parses() {
        let raw = serde_json::json!({
            "type": "setExternal",
            "nodeId": "bridge-1",
            "value": 42
        });
        let cmd: HostCommand = serde_json::from_value(raw).unwrap();
        assert_eq!(cmd, HostCommand::set_external("bridge-1", serde_json::json!(42)));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = serde_json::json!({ "type": "teleport", "nodeId": "x" });
        assert!(serde_json::from_value::<HostCommand>(raw).is_err());
    }

    #[test]
    fn node_update_wire_shape() {
        let update = Update::node("ctr-1", "change", Value::Number(3.0));
        let raw = update.to_json_value();
        assert_eq!(raw["nodeId"], "ctr-1");
        assert_eq!(raw["action"], "change");
        assert_eq!(raw["value"], 3);
        assert!(raw.get("edgeId").is_none());

        let traversal = Update::traversal("ctr-1", "change", Value::Number(3.0), "e7");
        assert_eq!(traversal.to_json_value()["edgeId"], "e7");
    }

    #[test]
    fn error_wire_shape_carries_descriptor() {
        let desc = NodeDescriptor::new("bad-1", "warp-drive");
        let report = ErrorReport::construction(desc, "unknown node kind: warp-drive");
        let raw = Update::error(report).to_json_value();
        assert_eq!(raw["type"], "error");
        assert_eq!(raw["nodeId"], "bad-1");
        assert_eq!(raw["node"]["kind"], "warp-drive");
    }

    #[test]
    fn display_is_compact() {
        let update = Update::node("led-1", "true", Value::Bool(true));
        assert_eq!(update.to_string(), "led-1/true = true");
        assert_eq!(
            Update::Board(BoardNotice::Ready).to_string(),
            "board: ready"
        );
    }
}
