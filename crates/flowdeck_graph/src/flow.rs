// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow graph: the import/export unit.

use crate::node::{FlowNode, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Flow-scoped environment variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name
    pub name: String,
    /// Raw value
    #[serde(default)]
    pub value: String,
    /// Value type tag (`str`, `num`, `bool`, `json`, `env`)
    #[serde(rename = "type", default = "EnvVar::default_type")]
    pub value_type: String,
}

impl EnvVar {
    /// Create a string-typed variable
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            value_type: Self::default_type(),
        }
    }

    fn default_type() -> String {
        "str".to_string()
    }
}

/// A named collection of nodes and their wiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    /// Flow ID
    pub id: String,
    /// Tab label
    #[serde(default)]
    pub label: String,
    /// Nodes in insertion order
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    /// Whether the flow is disabled
    #[serde(default)]
    pub disabled: bool,
    /// Free-text description
    #[serde(default)]
    pub info: String,
    /// Flow-scoped environment
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

impl FlowGraph {
    /// Create an empty, enabled flow
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            nodes: Vec::new(),
            disabled: false,
            info: String::new(),
            env: Vec::new(),
        }
    }

    /// Append a node
    pub fn with_node(mut self, node: FlowNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Get the first node with the given ID
    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|n| n.id.as_str() == id)
    }

    /// Check if a node with this ID exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of wire entries across all ports of all nodes
    pub fn wire_count(&self) -> usize {
        self.nodes.iter().map(|n| n.wires.iter().map(Vec::len).sum::<usize>()).sum()
    }

    /// Remove wire entries whose target is not a node of this flow.
    ///
    /// Port slots are kept so port indices stay stable. Returns the number
    /// of entries removed.
    pub fn prune_dangling_wires(&mut self) -> usize {
        let known: HashSet<NodeId> = self.node_ids().cloned().collect();
        let mut removed = 0;
        for node in &mut self.nodes {
            for port in &mut node.wires {
                let before = port.len();
                port.retain(|target| known.contains(target));
                removed += before - port.len();
            }
        }
        removed
    }
}
