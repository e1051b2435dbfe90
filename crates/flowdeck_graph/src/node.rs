// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow node definitions.
//!
//! A node keeps its type-specific configuration in a flattened map so that
//! fields this crate does not know about survive an import/export cycle.
//! Keys owned by the typed fields ([`RESERVED_KEYS`]) never enter that map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Persisted keys backed by typed [`FlowNode`] fields
pub const RESERVED_KEYS: [&str; 6] = ["id", "type", "x", "y", "name", "wires"];

/// Check if `key` belongs to a typed node field rather than the config map
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Unique identifier for a node within a flow
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A node instance in a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type key (see [`crate::registry::NodeRegistry`])
    #[serde(rename = "type")]
    pub node_type: String,
    /// Horizontal position in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Vertical position in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Display name, falls back to the type key when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Targets per output port: `wires[port]` lists the node IDs fed by that port
    #[serde(default)]
    pub wires: Vec<Vec<NodeId>>,
    /// Type-specific configuration
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl FlowNode {
    /// Create a node with no position, config or wiring
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            x: None,
            y: None,
            name: None,
            wires: Vec::new(),
            config: Map::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the full wiring table
    pub fn with_wires<I, P, T>(mut self, wires: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        self.wires = wires
            .into_iter()
            .map(|port| port.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    /// Set a configuration field. Reserved keys are ignored.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if is_reserved_key(&key) {
            tracing::debug!("Ignoring reserved config key '{key}' on node {}", self.id);
        } else {
            self.config.insert(key, value);
        }
        self
    }

    /// Position with missing coordinates treated as zero
    pub fn position(&self) -> [f64; 2] {
        [self.x.unwrap_or(0.0), self.y.unwrap_or(0.0)]
    }

    /// Label shown for this node
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.node_type,
        }
    }

    /// Iterate `(output port, target)` pairs in wiring order
    pub fn wire_targets(&self) -> impl Iterator<Item = (usize, &NodeId)> {
        self.wires
            .iter()
            .enumerate()
            .flat_map(|(port, targets)| targets.iter().map(move |target| (port, target)))
    }

    /// Check whether any output port feeds `target`
    pub fn is_wired_to(&self, target: &str) -> bool {
        self.wires.iter().flatten().any(|t| t.as_str() == target)
    }

    /// Shallow-merge a patch into this node: every field present in the patch
    /// replaces the current value wholesale. Reserved keys in the patch's
    /// config map are dropped; the ID never changes.
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        if let Some(node_type) = &patch.node_type {
            self.node_type.clone_from(node_type);
        }
        if let Some(x) = patch.x {
            self.x = Some(x);
        }
        if let Some(y) = patch.y {
            self.y = Some(y);
        }
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if let Some(wires) = &patch.wires {
            self.wires.clone_from(wires);
        }
        for (key, value) in &patch.config {
            if is_reserved_key(key) {
                tracing::debug!("Dropping reserved key '{key}' from patch for node {}", self.id);
                continue;
            }
            self.config.insert(key.clone(), value.clone());
        }
    }
}

/// Partial node update for [`FlowNode::apply_patch`]
///
/// The node ID is not patchable: an `id` key in a deserialized patch lands
/// in `config` and is dropped when the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    /// Replacement type key
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Replacement x coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Replacement y coordinate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Replacement display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement wiring table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wires: Option<Vec<Vec<NodeId>>>,
    /// Configuration fields to overwrite
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

impl NodePatch {
    /// Create an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the position
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Replace the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the type key
    pub fn node_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    /// Replace the wiring table
    pub fn wires(mut self, wires: Vec<Vec<NodeId>>) -> Self {
        self.wires = Some(wires);
        self
    }

    /// Overwrite one configuration field. Reserved keys are ignored.
    pub fn config(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if is_reserved_key(&key) {
            tracing::debug!("Ignoring reserved key '{key}' in node patch");
        } else {
            self.config.insert(key, value);
        }
        self
    }

    /// Check if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.node_type.is_none()
            && self.x.is_none()
            && self.y.is_none()
            && self.name.is_none()
            && self.wires.is_none()
            && self.config.is_empty()
    }
}
