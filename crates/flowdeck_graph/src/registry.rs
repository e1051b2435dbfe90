// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node type descriptors and the registry that resolves them.
//!
//! Lookups never fail: an unknown type key resolves to
//! [`DEFAULT_NODE_COLOR`] and [`DEFAULT_NODE_ICON`].

use crate::node::{FlowNode, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fill color for nodes whose type is not registered
pub const DEFAULT_NODE_COLOR: &str = "#dddddd";

/// Icon for nodes whose type is not registered
pub const DEFAULT_NODE_ICON: &str = "node";

/// Palette category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Injection, debugging, annotation
    Common,
    /// Message transformation and routing
    Function,
    /// Protocol endpoints
    Network,
    /// Device, metric and alerting nodes
    Monitoring,
    /// Anything registered at runtime outside the built-in palette
    Custom,
}

impl NodeCategory {
    /// Get display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Function => "Function",
            Self::Network => "Network",
            Self::Monitoring => "Monitoring",
            Self::Custom => "Custom",
        }
    }
}

/// Node type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type key
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Configuration a new node of this type starts with
    pub defaults: Map<String, Value>,
    /// Number of input ports (0 or 1 in practice)
    pub inputs: usize,
    /// Number of output ports
    pub outputs: usize,
    /// Fill color (CSS hex)
    pub color: String,
    /// Icon name
    pub icon: String,
}

/// Registry of available node types
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    /// Registered node types by type key, in registration order
    types: IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Create a registry holding the built-in palette
    pub fn builtin() -> Self {
        crate::catalog::create_builtin_registry()
    }

    /// Register a node type.
    ///
    /// Re-registering a key replaces the descriptor but keeps its original
    /// position, so first-registered ordering is stable.
    pub fn register(&mut self, node_type: NodeType) {
        if let Some(previous) = self.types.insert(node_type.id.clone(), node_type) {
            tracing::debug!("Replaced node type descriptor: {}", previous.id);
        }
    }

    /// Get a node type by key
    pub fn lookup(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Fill color for a type key
    pub fn color_of(&self, id: &str) -> &str {
        self.lookup(id).map_or(DEFAULT_NODE_COLOR, |t| t.color.as_str())
    }

    /// Icon for a type key
    pub fn icon_of(&self, id: &str) -> &str {
        self.lookup(id).map_or(DEFAULT_NODE_ICON, |t| t.icon.as_str())
    }

    /// Color of the first-registered type in each category, in the order
    /// categories were first seen
    pub fn category_colors(&self) -> IndexMap<NodeCategory, &str> {
        let mut colors = IndexMap::new();
        for node_type in self.types.values() {
            colors
                .entry(node_type.category)
                .or_insert(node_type.color.as_str());
        }
        colors
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type key, with the type's default configuration
    /// and one empty wire list per output port
    pub fn create_node(&self, type_id: &str) -> Option<FlowNode> {
        self.lookup(type_id).map(|t| FlowNode {
            id: NodeId::new(),
            node_type: t.id.clone(),
            x: None,
            y: None,
            name: None,
            wires: vec![Vec::new(); t.outputs],
            config: t.defaults.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(id: &str, category: NodeCategory, color: &str) -> NodeType {
        NodeType {
            id: id.to_string(),
            name: id.to_string(),
            category,
            description: String::new(),
            defaults: Map::new(),
            inputs: 1,
            outputs: 1,
            color: color.to_string(),
            icon: format!("{id}-icon"),
        }
    }

    #[test]
    fn test_unknown_type_falls_back() {
        let registry = NodeRegistry::new();
        assert!(registry.lookup("nope").is_none());
        assert_eq!(registry.color_of("nope"), DEFAULT_NODE_COLOR);
        assert_eq!(registry.icon_of("nope"), DEFAULT_NODE_ICON);
        assert!(registry.create_node("nope").is_none());
    }

    #[test]
    fn test_lookup_registered() {
        let mut registry = NodeRegistry::new();
        registry.register(descriptor("a", NodeCategory::Common, "#111111"));
        assert_eq!(registry.color_of("a"), "#111111");
        assert_eq!(registry.icon_of("a"), "a-icon");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_category_colors_first_wins() {
        let mut registry = NodeRegistry::new();
        registry.register(descriptor("b1", NodeCategory::Network, "#bbbbb1"));
        registry.register(descriptor("a1", NodeCategory::Common, "#aaaaa1"));
        registry.register(descriptor("b2", NodeCategory::Network, "#bbbbb2"));
        registry.register(descriptor("a2", NodeCategory::Common, "#aaaaa2"));

        let colors = registry.category_colors();
        let pairs: Vec<_> = colors.iter().map(|(c, color)| (*c, *color)).collect();
        assert_eq!(
            pairs,
            vec![
                (NodeCategory::Network, "#bbbbb1"),
                (NodeCategory::Common, "#aaaaa1"),
            ]
        );
    }

    #[test]
    fn test_reregister_keeps_position() {
        let mut registry = NodeRegistry::new();
        registry.register(descriptor("a", NodeCategory::Common, "#000001"));
        registry.register(descriptor("b", NodeCategory::Common, "#000002"));
        registry.register(descriptor("a", NodeCategory::Common, "#000003"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.category_colors()[&NodeCategory::Common], "#000003");
    }

    #[test]
    fn test_create_node_uses_defaults() {
        let mut registry = NodeRegistry::new();
        let mut switch = descriptor("switch", NodeCategory::Function, "#e2d96e");
        switch.outputs = 3;
        switch.defaults.insert("property".to_string(), json!("payload"));
        registry.register(switch);

        let node = registry.create_node("switch").unwrap();
        assert_eq!(node.node_type, "switch");
        assert_eq!(node.wires.len(), 3);
        assert_eq!(node.config["property"], json!("payload"));
    }
}
