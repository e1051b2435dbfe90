// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow to render-graph conversion.
//!
//! [`parse_flow`] turns a persisted [`FlowGraph`] and the set of currently
//! active node IDs into a flat node/edge description for a rendering
//! surface. Malformed input degrades instead of failing:
//! - wires pointing at nodes that are not in the flow produce no edge
//! - unknown node types get the registry's default color and icon
//! - every edge lands on input port 0 of its target

use crate::flow::FlowGraph;
use crate::node::NodeId;
use crate::registry::NodeRegistry;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::BuildHasher;

/// Border color of an active node and stroke of an active edge
pub const ACTIVE_COLOR: &str = "#ff6d00";

/// Border color of an idle node
pub const IDLE_BORDER_COLOR: &str = "#999999";

/// Stroke of an idle edge
pub const IDLE_EDGE_COLOR: &str = "#b1b1b7";

/// Membership test for the set of nodes currently highlighted by a simulation
pub trait ActiveNodes {
    /// Check if the node is active
    fn is_active(&self, id: &NodeId) -> bool;
}

impl ActiveNodes for [NodeId] {
    fn is_active(&self, id: &NodeId) -> bool {
        self.contains(id)
    }
}

impl ActiveNodes for Vec<NodeId> {
    fn is_active(&self, id: &NodeId) -> bool {
        self.as_slice().is_active(id)
    }
}

impl<S: BuildHasher> ActiveNodes for HashSet<NodeId, S> {
    fn is_active(&self, id: &NodeId) -> bool {
        self.contains(id)
    }
}

impl<S: BuildHasher> ActiveNodes for IndexSet<NodeId, S> {
    fn is_active(&self, id: &NodeId) -> bool {
        self.contains(id)
    }
}

impl<V, S: BuildHasher> ActiveNodes for IndexMap<NodeId, V, S> {
    fn is_active(&self, id: &NodeId) -> bool {
        self.contains_key(id)
    }
}

/// Visual emphasis of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    /// Fill color from the node's type
    pub background: String,
    /// Border color
    pub border_color: String,
    /// Border width in pixels
    pub border_width: f32,
}

/// A node ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    /// Source node ID
    pub id: NodeId,
    /// Node type key
    pub node_type: String,
    /// Position, missing coordinates are zero
    pub position: [f64; 2],
    /// Display label
    pub label: String,
    /// Icon name
    pub icon: String,
    /// Whether the node is in the active set
    pub active: bool,
    /// Fill and border
    pub style: NodeStyle,
}

/// Stroke of an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    /// Stroke color
    pub stroke: String,
    /// Stroke width in pixels
    pub stroke_width: f32,
}

/// A directed edge ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    /// `{source}-{port}-{target}`
    pub id: String,
    /// Source node ID
    pub source: NodeId,
    /// Output port index on the source
    pub source_port: usize,
    /// Target node ID
    pub target: NodeId,
    /// Input port index on the target, always 0
    pub target_port: usize,
    /// Set when both endpoints are active
    pub animated: bool,
    /// Stroke
    pub style: EdgeStyle,
}

/// Renderable description of a flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderGraph {
    /// Nodes in flow order
    pub nodes: Vec<RenderNode>,
    /// Edges in wiring order
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    /// Find a rendered node
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Find a rendered edge
    pub fn edge(&self, id: &str) -> Option<&RenderEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Build the edge ID for a wire
pub fn edge_id(source: &NodeId, port: usize, target: &NodeId) -> String {
    format!("{source}-{port}-{target}")
}

/// Convert a flow into its renderable form
pub fn parse_flow<A>(flow: &FlowGraph, active: &A, registry: &NodeRegistry) -> RenderGraph
where
    A: ActiveNodes + ?Sized,
{
    let nodes = flow
        .nodes
        .iter()
        .map(|node| {
            let is_active = active.is_active(&node.id);
            RenderNode {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                position: node.position(),
                label: node.label().to_string(),
                icon: registry.icon_of(&node.node_type).to_string(),
                active: is_active,
                style: node_style(registry.color_of(&node.node_type), is_active),
            }
        })
        .collect();

    let known: HashSet<&NodeId> = flow.node_ids().collect();
    let mut seen: HashSet<(&NodeId, usize, &NodeId)> = HashSet::new();
    let mut edges = Vec::with_capacity(flow.wire_count());

    for node in &flow.nodes {
        let source_active = active.is_active(&node.id);
        for (port, target) in node.wire_targets() {
            if !known.contains(target) {
                tracing::trace!("Skipping dangling wire {}:{} -> {}", node.id, port, target);
                continue;
            }
            if !seen.insert((&node.id, port, target)) {
                continue;
            }
            let animated = source_active && active.is_active(target);
            edges.push(RenderEdge {
                id: edge_id(&node.id, port, target),
                source: node.id.clone(),
                source_port: port,
                target: target.clone(),
                target_port: 0,
                animated,
                style: edge_style(animated),
            });
        }
    }

    RenderGraph { nodes, edges }
}

fn node_style(background: &str, active: bool) -> NodeStyle {
    if active {
        NodeStyle {
            background: background.to_string(),
            border_color: ACTIVE_COLOR.to_string(),
            border_width: 3.0,
        }
    } else {
        NodeStyle {
            background: background.to_string(),
            border_color: IDLE_BORDER_COLOR.to_string(),
            border_width: 1.0,
        }
    }
}

fn edge_style(animated: bool) -> EdgeStyle {
    if animated {
        EdgeStyle {
            stroke: ACTIVE_COLOR.to_string(),
            stroke_width: 2.5,
        }
    } else {
        EdgeStyle {
            stroke: IDLE_EDGE_COLOR.to_string(),
            stroke_width: 1.5,
        }
    }
}
