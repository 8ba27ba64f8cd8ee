//! Declarative graph description received from the host.
//!
//! Descriptors are plain data: the instantiator turns node descriptors into
//! live components and the router walks edge descriptors on every emission.
//! A new descriptor for an existing id replaces the live instance wholesale;
//! descriptors are never patched in place.

use serde::{Deserialize, Serialize};

/// One node in a graph snapshot: identity, behavioral kind, and an open
/// config map whose shape each kind defines for itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl NodeDescriptor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            config: serde_json::Map::new(),
        }
    }

    /// Add one config entry. Chainable; mostly a test/demo convenience.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// One directed edge: `sourceHandle` names the signal on the source
/// component, `targetHandle` an action (or input slot) on the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    pub id: String,
    pub source_id: String,
    pub source_handle: String,
    pub target_id: String,
    pub target_handle: String,
}

impl EdgeDescriptor {
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        source_handle: impl Into<String>,
        target_id: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            source_handle: source_handle.into(),
            target_id: target_id.into(),
            target_handle: target_handle.into(),
        }
    }
}
