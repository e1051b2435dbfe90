// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow graph model for Flowdeck.
//!
//! Flows are Node-RED style: typed nodes wired port-to-node, where
//! `wires[i]` lists the nodes fed by output port `i`.
//!
//! ## Architecture
//!
//! - [`registry`]: node type descriptors (ports, defaults, color, icon)
//! - [`flow`] and [`node`]: the persisted flow unit
//! - [`parser`]: flow + active node set to a renderable node/edge graph
//! - [`validate`]: structural diagnostics the parser does not surface

pub mod catalog;
pub mod flow;
pub mod node;
pub mod parser;
pub mod registry;
pub mod validate;

pub use flow::{EnvVar, FlowGraph};
pub use node::{FlowNode, NodeId, NodePatch};
pub use parser::{parse_flow, ActiveNodes, RenderEdge, RenderGraph, RenderNode};
pub use registry::{NodeCategory, NodeRegistry, NodeType};
pub use validate::{validate_flow, FlowIssue, Severity};
