// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structural checks for a flow.
//!
//! The parser silently tolerates malformed wiring; this module reports it.

use crate::flow::FlowGraph;
use crate::node::NodeId;
use crate::registry::NodeRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Renders, but probably not what the author meant
    Warning,
    /// The flow is inconsistent
    Error,
}

/// A structural problem found in a flow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FlowIssue {
    /// Two nodes share an ID
    #[error("Duplicate node id: {id}")]
    DuplicateNodeId {
        /// The shared ID
        id: NodeId,
    },

    /// Node type is not in the registry
    #[error("Node {node} has unknown type '{node_type}'")]
    UnknownNodeType {
        /// Offending node
        node: NodeId,
        /// Its type key
        node_type: String,
    },

    /// Wire target is not a node of this flow
    #[error("Wire {node}:{port} points at missing node {target}")]
    DanglingWire {
        /// Source node
        node: NodeId,
        /// Output port
        port: usize,
        /// Missing target
        target: NodeId,
    },

    /// Wire leaves from a port the node type does not have
    #[error("Node {node} wires output port {port} but its type has {outputs} outputs")]
    PortOutOfRange {
        /// Source node
        node: NodeId,
        /// Output port
        port: usize,
        /// Declared output count
        outputs: usize,
    },

    /// Wire feeds a node whose type has no input port
    #[error("Wire {node}:{port} -> {target} feeds a '{target_type}' node, which has no inputs")]
    TargetWithoutInputs {
        /// Source node
        node: NodeId,
        /// Output port
        port: usize,
        /// Target node
        target: NodeId,
        /// Target's type key
        target_type: String,
    },

    /// Same port wired to the same target more than once
    #[error("Wire {node}:{port} -> {target} is listed more than once")]
    DuplicateWire {
        /// Source node
        node: NodeId,
        /// Output port
        port: usize,
        /// Repeated target
        target: NodeId,
    },
}

impl FlowIssue {
    /// Severity of this issue
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateNodeId { .. } | Self::PortOutOfRange { .. } | Self::TargetWithoutInputs { .. } => {
                Severity::Error
            }
            Self::UnknownNodeType { .. } | Self::DanglingWire { .. } | Self::DuplicateWire { .. } => {
                Severity::Warning
            }
        }
    }
}

/// Check a flow against the registry and report every issue found,
/// in node order
pub fn validate_flow(flow: &FlowGraph, registry: &NodeRegistry) -> Vec<FlowIssue> {
    let mut issues = Vec::new();
    let mut types: HashMap<&NodeId, &str> = HashMap::new();
    let mut reported: HashSet<&NodeId> = HashSet::new();

    for node in &flow.nodes {
        if types.contains_key(&node.id) {
            if reported.insert(&node.id) {
                issues.push(FlowIssue::DuplicateNodeId {
                    id: node.id.clone(),
                });
            }
        } else {
            types.insert(&node.id, &node.node_type);
        }
    }

    for node in &flow.nodes {
        let descriptor = registry.lookup(&node.node_type);
        if descriptor.is_none() {
            issues.push(FlowIssue::UnknownNodeType {
                node: node.id.clone(),
                node_type: node.node_type.clone(),
            });
        }

        if let Some(descriptor) = descriptor {
            for (port, targets) in node.wires.iter().enumerate() {
                if port >= descriptor.outputs && !targets.is_empty() {
                    issues.push(FlowIssue::PortOutOfRange {
                        node: node.id.clone(),
                        port,
                        outputs: descriptor.outputs,
                    });
                }
            }
        }

        let mut wired: HashSet<(usize, &NodeId)> = HashSet::new();
        for (port, target) in node.wire_targets() {
            match types.get(target) {
                None => issues.push(FlowIssue::DanglingWire {
                    node: node.id.clone(),
                    port,
                    target: target.clone(),
                }),
                Some(target_type) => {
                    if registry.lookup(target_type).is_some_and(|t| t.inputs == 0) {
                        issues.push(FlowIssue::TargetWithoutInputs {
                            node: node.id.clone(),
                            port,
                            target: target.clone(),
                            target_type: target_type.to_string(),
                        });
                    }
                }
            }
            if !wired.insert((port, target)) {
                issues.push(FlowIssue::DuplicateWire {
                    node: node.id.clone(),
                    port,
                    target: target.clone(),
                });
            }
        }
    }

    issues
}

/// Check if any issue is an error
pub fn has_errors(issues: &[FlowIssue]) -> bool {
    issues.iter().any(|i| i.severity() == Severity::Error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FlowNode;

    #[test]
    fn test_clean_flow() {
        let flow = FlowGraph::new("f", "Clean")
            .with_node(FlowNode::new("a", "inject").with_wires([vec!["b"]]))
            .with_node(FlowNode::new("b", "debug"));
        assert!(validate_flow(&flow, &NodeRegistry::builtin()).is_empty());
    }

    #[test]
    fn test_reports_each_issue_kind() {
        let flow = FlowGraph::new("f", "Messy")
            .with_node(FlowNode::new("a", "inject").with_wires([vec!["b", "b", "ghost"], vec!["b"]]))
            .with_node(FlowNode::new("b", "debug"))
            .with_node(FlowNode::new("b", "mystery"));
        let issues = validate_flow(&flow, &NodeRegistry::builtin());

        assert!(issues.contains(&FlowIssue::DuplicateNodeId { id: "b".into() }));
        assert!(issues.contains(&FlowIssue::UnknownNodeType {
            node: "b".into(),
            node_type: "mystery".to_string(),
        }));
        assert!(issues.contains(&FlowIssue::DanglingWire {
            node: "a".into(),
            port: 0,
            target: "ghost".into(),
        }));
        assert!(issues.contains(&FlowIssue::DuplicateWire {
            node: "a".into(),
            port: 0,
            target: "b".into(),
        }));
        assert!(issues.contains(&FlowIssue::PortOutOfRange {
            node: "a".into(),
            port: 1,
            outputs: 1,
        }));
        assert_eq!(issues.len(), 5);
        assert!(has_errors(&issues));
    }

    #[test]
    fn test_duplicate_id_reported_once() {
        let flow = FlowGraph::new("f", "Triple")
            .with_node(FlowNode::new("n", "debug"))
            .with_node(FlowNode::new("n", "debug"))
            .with_node(FlowNode::new("n", "debug"));
        let issues = validate_flow(&flow, &NodeRegistry::builtin());
        assert_eq!(issues, vec![FlowIssue::DuplicateNodeId { id: "n".into() }]);
    }

    #[test]
    fn test_warnings_only() {
        let flow = FlowGraph::new("f", "Dangling")
            .with_node(FlowNode::new("a", "inject").with_wires([vec!["gone"]]));
        let issues = validate_flow(&flow, &NodeRegistry::builtin());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity(), Severity::Warning);
        assert!(!has_errors(&issues));
        assert_eq!(issues[0].to_string(), "Wire a:0 points at missing node gone");
    }

    #[test]
    fn test_wire_into_node_without_inputs() {
        let flow = FlowGraph::new("f", "Backwards")
            .with_node(FlowNode::new("fn", "function").with_wires([vec!["tick", "note", "out"]]))
            .with_node(FlowNode::new("tick", "inject"))
            .with_node(FlowNode::new("note", "comment"))
            .with_node(FlowNode::new("out", "debug"));
        let issues = validate_flow(&flow, &NodeRegistry::builtin());

        assert_eq!(
            issues,
            vec![
                FlowIssue::TargetWithoutInputs {
                    node: "fn".into(),
                    port: 0,
                    target: "tick".into(),
                    target_type: "inject".to_string(),
                },
                FlowIssue::TargetWithoutInputs {
                    node: "fn".into(),
                    port: 0,
                    target: "note".into(),
                    target_type: "comment".to_string(),
                },
            ]
        );
        assert!(has_errors(&issues));
        assert_eq!(
            issues[0].to_string(),
            "Wire fn:0 -> tick feeds a 'inject' node, which has no inputs"
        );
    }

    #[test]
    fn test_empty_trailing_ports_allowed() {
        let flow = FlowGraph::new("f", "Padded")
            .with_node(FlowNode::new("a", "inject").with_wires([Vec::<&str>::new(), Vec::new()]));
        assert!(validate_flow(&flow, &NodeRegistry::builtin()).is_empty());
    }
}
