// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flow store: the single mutable state container for flow editing.
//!
//! Holds every loaded flow, the current flow and selection, the clipboard
//! and the simulation overlay. Node-level mutators act on the current flow
//! and are silent no-ops when the flow or node does not exist.

use crate::config::StoreConfig;
use crate::simulation::{SimulationEvent, SimulationState};
use flowdeck_graph::{parse_flow, FlowGraph, FlowNode, NodeId, NodePatch, NodeRegistry, RenderGraph};
use std::time::Instant;
use thiserror::Error;

/// Errors crossing the flow import/export boundary
#[derive(Debug, Error)]
pub enum FlowFormatError {
    /// Not a valid flow document
    #[error("Invalid flow JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Flow has an empty ID
    #[error("Flow id must not be empty")]
    EmptyId,
}

/// Editing and simulation state for a set of flows
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStore {
    flows: Vec<FlowGraph>,
    current_flow_id: Option<String>,
    selected_node_id: Option<NodeId>,
    clipboard: Option<FlowNode>,
    simulation: SimulationState,
    editing_config: bool,
    config: StoreConfig,
}

impl FlowStore {
    /// Create an empty store
    pub fn new(config: StoreConfig) -> Self {
        let simulation = SimulationState::new(config.event_log_capacity, config.activation_window());
        Self {
            flows: Vec::new(),
            current_flow_id: None,
            selected_node_id: None,
            clipboard: None,
            simulation,
            editing_config: false,
            config,
        }
    }

    /// Create a store seeded with flows; the first one becomes current
    pub fn with_flows(config: StoreConfig, flows: Vec<FlowGraph>) -> Self {
        let mut store = Self::new(config);
        store.current_flow_id = flows.first().map(|f| f.id.clone());
        store.flows = flows;
        store
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// All flows in load order
    pub fn flows(&self) -> &[FlowGraph] {
        &self.flows
    }

    /// Get a flow by ID
    pub fn flow(&self, id: &str) -> Option<&FlowGraph> {
        self.flows.iter().find(|f| f.id == id)
    }

    /// ID of the current flow
    pub fn current_flow_id(&self) -> Option<&str> {
        self.current_flow_id.as_deref()
    }

    /// The current flow, if one is set and exists
    pub fn current_flow(&self) -> Option<&FlowGraph> {
        self.current_flow_id.as_deref().and_then(|id| self.flow(id))
    }

    fn current_flow_mut(&mut self) -> Option<&mut FlowGraph> {
        let id = self.current_flow_id.as_deref()?;
        self.flows.iter_mut().find(|f| f.id == id)
    }

    /// ID of the selected node
    pub fn selected_node_id(&self) -> Option<&NodeId> {
        self.selected_node_id.as_ref()
    }

    /// The selected node in the current flow
    pub fn selected_node(&self) -> Option<&FlowNode> {
        let id = self.selected_node_id.as_ref()?;
        self.current_flow()?.node(id.as_str())
    }

    /// Node snapshot held by the clipboard
    pub fn clipboard(&self) -> Option<&FlowNode> {
        self.clipboard.as_ref()
    }

    /// Simulation overlay
    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    /// Store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Whether an editing surface has claimed the node config
    pub fn is_editing_config(&self) -> bool {
        self.editing_config
    }

    // ------------------------------------------------------------------
    // Node editing
    // ------------------------------------------------------------------

    /// Append a node to the current flow. IDs are not checked for uniqueness.
    pub fn add_node(&mut self, node: FlowNode) {
        match self.current_flow_mut() {
            Some(flow) => {
                tracing::debug!("Added node {} ({}) to flow {}", node.id, node.node_type, flow.id);
                flow.nodes.push(node);
            }
            None => tracing::debug!("add_node ignored: no current flow"),
        }
    }

    /// Shallow-merge `patch` into a node of the current flow
    pub fn update_node(&mut self, id: &str, patch: &NodePatch) {
        match self.current_flow_mut().and_then(|f| f.node_mut(id)) {
            Some(node) => node.apply_patch(patch),
            None => tracing::debug!("update_node ignored: node {id} not found"),
        }
    }

    /// Remove a node from the current flow.
    ///
    /// Wires in other nodes that point at it are left in place. A pending
    /// simulation highlight on the node is cancelled.
    pub fn remove_node(&mut self, id: &str) {
        let Some(flow) = self.current_flow_mut() else {
            tracing::debug!("remove_node ignored: no current flow");
            return;
        };
        let before = flow.nodes.len();
        flow.nodes.retain(|n| n.id.as_str() != id);
        if flow.nodes.len() == before {
            tracing::debug!("remove_node ignored: node {id} not found");
            return;
        }
        if self.selected_node_id.as_ref().is_some_and(|s| s.as_str() == id) {
            self.selected_node_id = None;
        }
        if self.simulation.deactivate(&NodeId::from(id)) {
            tracing::debug!("Node {id} inactive");
        }
    }

    /// Select a node of the current flow
    pub fn select_node(&mut self, id: &str) {
        let found = self.current_flow().and_then(|f| f.node(id)).map(|n| n.id.clone());
        match found {
            Some(node_id) => self.selected_node_id = Some(node_id),
            None => tracing::debug!("select_node ignored: node {id} not found"),
        }
    }

    /// Clear the node selection
    pub fn clear_selection(&mut self) {
        self.selected_node_id = None;
    }

    /// Snapshot a node of the current flow into the clipboard
    pub fn copy_node(&mut self, id: &str) {
        let snapshot = self.current_flow().and_then(|f| f.node(id)).cloned();
        match snapshot {
            Some(node) => self.clipboard = Some(node),
            None => tracing::debug!("copy_node ignored: node {id} not found"),
        }
    }

    /// Add a copy of the clipboard node to the current flow, offset from the
    /// original position. The copy gets a fresh ID and unconnected ports.
    pub fn paste_node(&mut self) -> Option<NodeId> {
        let source = self.clipboard.as_ref()?;
        let flow = self.current_flow()?;

        let mut id = NodeId::new();
        while id == source.id || flow.contains_node(id.as_str()) {
            id = NodeId::new();
        }

        let [x, y] = source.position();
        let [dx, dy] = self.config.paste_offset;
        let node = FlowNode {
            id: id.clone(),
            node_type: source.node_type.clone(),
            x: Some(x + dx),
            y: Some(y + dy),
            name: source.name.clone(),
            wires: vec![Vec::new(); source.wires.len()],
            config: source.config.clone(),
        };
        self.add_node(node);
        Some(id)
    }

    /// Remove dangling wire entries from the current flow
    pub fn prune_dangling_wires(&mut self) -> usize {
        self.current_flow_mut().map_or(0, FlowGraph::prune_dangling_wires)
    }

    /// Set the advisory config-editing flag
    pub fn set_editing_config(&mut self, editing: bool) {
        self.editing_config = editing;
    }

    // ------------------------------------------------------------------
    // Flows
    // ------------------------------------------------------------------

    /// Insert or wholly replace a flow by ID and make it current
    pub fn import_flow(&mut self, flow: FlowGraph) {
        let id = flow.id.clone();
        match self.flows.iter_mut().find(|f| f.id == id) {
            Some(existing) => {
                *existing = flow;
                tracing::info!("Replaced flow {id}");
            }
            None => {
                self.flows.push(flow);
                tracing::info!("Imported flow {id}");
            }
        }
        self.current_flow_id = Some(id);
    }

    /// Parse a JSON flow document and import it
    pub fn import_flow_json(&mut self, json: &str) -> Result<(), FlowFormatError> {
        let flow: FlowGraph = serde_json::from_str(json)?;
        if flow.id.is_empty() {
            return Err(FlowFormatError::EmptyId);
        }
        self.import_flow(flow);
        Ok(())
    }

    /// The flow to hand to external serialization: the current flow, or the
    /// first flow when none is current
    pub fn export_flow(&self) -> Option<&FlowGraph> {
        self.current_flow().or_else(|| self.flows.first())
    }

    /// Export as pretty JSON
    pub fn export_flow_json(&self) -> Result<Option<String>, FlowFormatError> {
        self.export_flow()
            .map(serde_json::to_string_pretty)
            .transpose()
            .map_err(FlowFormatError::from)
    }

    /// Switch the current flow. Unknown IDs are ignored.
    pub fn set_current_flow(&mut self, id: &str) {
        if self.flow(id).is_some() {
            self.current_flow_id = Some(id.to_string());
            self.selected_node_id = None;
        } else {
            tracing::debug!("set_current_flow ignored: flow {id} not found");
        }
    }

    /// Remove a flow; if it was current, no flow is current afterwards
    pub fn remove_flow(&mut self, id: &str) -> Option<FlowGraph> {
        let index = self.flows.iter().position(|f| f.id == id)?;
        let flow = self.flows.remove(index);
        if self.current_flow_id.as_deref() == Some(id) {
            self.current_flow_id = None;
            self.selected_node_id = None;
        }
        tracing::info!("Removed flow {id}");
        Some(flow)
    }

    /// Render the exported flow with the current active-node set
    pub fn render(&self, registry: &NodeRegistry) -> Option<RenderGraph> {
        self.export_flow()
            .map(|flow| parse_flow(flow, &self.simulation, registry))
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Reset the simulation to an empty log and start it
    pub fn start_simulation(&mut self) {
        self.simulation.start();
        tracing::info!("Simulation started");
    }

    /// Stop the simulation, clearing active nodes but keeping the log
    pub fn stop_simulation(&mut self) {
        self.simulation.stop();
        tracing::info!(events = self.simulation.event_count(), "Simulation stopped");
    }

    /// Record an event now
    pub fn add_simulation_event(&mut self, event: SimulationEvent) {
        self.add_simulation_event_at(event, Instant::now());
    }

    /// Record an event as of `now`, activating its node until
    /// `now + activation_window`
    pub fn add_simulation_event_at(&mut self, event: SimulationEvent, now: Instant) {
        let node_id = event.node_id().clone();
        if self.simulation.record(event, now) {
            tracing::debug!("Node {node_id} active");
        } else {
            tracing::debug!("Node {node_id} re-activated");
        }
    }

    /// Deactivate nodes whose window has passed; call from the host loop
    pub fn expire_active_nodes(&mut self, now: Instant) -> Vec<NodeId> {
        let expired = self.simulation.expire(now);
        for id in &expired {
            tracing::debug!("Node {id} inactive");
        }
        expired
    }
}

impl Default for FlowStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_graph::ActiveNodes;
    use serde_json::json;
    use std::time::Duration;

    fn sample_flow() -> FlowGraph {
        FlowGraph::new("f1", "Device alerts")
            .with_node(
                FlowNode::new("A", "device status")
                    .with_position(100.0, 100.0)
                    .with_wires([vec!["B", "C"]]),
            )
            .with_node(
                FlowNode::new("B", "sms command")
                    .with_position(300.0, 60.0)
                    .with_name("Page on-call")
                    .with_config("template", json!("offline-alert"))
                    .with_wires([vec!["C"]]),
            )
            .with_node(FlowNode::new("C", "debug").with_position(300.0, 140.0))
    }

    fn store() -> FlowStore {
        FlowStore::with_flows(StoreConfig::default(), vec![sample_flow()])
    }

    #[test]
    fn test_seeded_store() {
        let store = store();
        assert_eq!(store.current_flow_id(), Some("f1"));
        assert_eq!(store.current_flow().unwrap().node_count(), 3);
        assert!(store.selected_node().is_none());
        assert!(!store.simulation().is_running());
    }

    #[test]
    fn test_missing_ids_change_nothing() {
        let mut store = store();
        store.select_node("B");
        store.copy_node("C");
        let before = store.clone();

        store.update_node("ghost", &NodePatch::new().name("x"));
        store.remove_node("ghost");
        store.select_node("ghost");
        store.copy_node("ghost");

        assert_eq!(store, before);
    }

    #[test]
    fn test_add_node_without_uniqueness_check() {
        let mut store = store();
        store.add_node(FlowNode::new("C", "debug"));
        let flow = store.current_flow().unwrap();
        assert_eq!(flow.node_count(), 4);
        assert_eq!(flow.node_ids().filter(|id| id.as_str() == "C").count(), 2);
    }

    #[test]
    fn test_add_node_without_current_flow() {
        let mut store = FlowStore::default();
        store.add_node(FlowNode::new("A", "inject"));
        assert!(store.flows().is_empty());
        assert!(store.paste_node().is_none());
    }

    #[test]
    fn test_update_node_merges() {
        let mut store = store();
        store.update_node("B", &NodePatch::new().position(10.0, 20.0).config("recipient", json!("+100")));
        let b = store.current_flow().unwrap().node("B").unwrap();
        assert_eq!(b.position(), [10.0, 20.0]);
        assert_eq!(b.config["template"], json!("offline-alert"));
        assert_eq!(b.config["recipient"], json!("+100"));
        assert_eq!(b.label(), "Page on-call");
    }

    #[test]
    fn test_patched_flow_reimports() {
        let mut store = store();
        let patch: NodePatch = serde_json::from_value(json!({"id": "Z", "name": "renamed"})).unwrap();
        store.update_node("A", &patch);

        let exported = store.export_flow_json().unwrap().unwrap();
        let mut reloaded = FlowStore::default();
        reloaded.import_flow_json(&exported).unwrap();

        let flow = reloaded.current_flow().unwrap();
        assert_eq!(flow, store.current_flow().unwrap());
        assert_eq!(flow.node("A").unwrap().label(), "renamed");
        assert!(flow.node("Z").is_none());
    }

    #[test]
    fn test_remove_node_cancels_highlight() {
        let mut store = store();
        let now = Instant::now();
        store.start_simulation();
        store.add_simulation_event_at(SimulationEvent::new("B", json!(1)), now);
        store.add_simulation_event_at(SimulationEvent::new("C", json!(2)), now);

        store.remove_node("B");

        let active: Vec<_> = store.simulation().active_nodes().map(NodeId::as_str).collect();
        assert_eq!(active, vec!["C"]);
        assert_eq!(store.simulation().event_count(), 2);
    }

    #[test]
    fn test_remove_node_keeps_dangling_wires() {
        let mut store = store();
        store.select_node("B");
        store.remove_node("B");

        let flow = store.current_flow().unwrap();
        assert!(!flow.contains_node("B"));
        assert!(flow.node("A").unwrap().is_wired_to("B"));
        assert!(store.selected_node_id().is_none());

        let graph = store.render(&NodeRegistry::builtin()).unwrap();
        let edge_ids: Vec<_> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(edge_ids, vec!["A-0-C"]);
    }

    #[test]
    fn test_prune_after_remove() {
        let mut store = store();
        store.remove_node("B");
        assert_eq!(store.prune_dangling_wires(), 1);
        assert!(!store.current_flow().unwrap().node("A").unwrap().is_wired_to("B"));
    }

    #[test]
    fn test_copy_paste() {
        let mut store = store();
        store.copy_node("B");
        let new_id = store.paste_node().unwrap();

        let flow = store.current_flow().unwrap();
        assert_eq!(flow.node_count(), 4);
        assert_ne!(new_id, NodeId::from("B"));
        assert_eq!(flow.node_ids().filter(|id| **id == new_id).count(), 1);

        let original = flow.node("B").unwrap();
        let pasted = flow.node(new_id.as_str()).unwrap();
        assert_eq!(pasted.position(), [350.0, 110.0]);
        assert_eq!(pasted.node_type, original.node_type);
        assert_eq!(pasted.config, original.config);
        assert_eq!(pasted.name, original.name);
        assert_eq!(pasted.wires, vec![Vec::<NodeId>::new()]);
    }

    #[test]
    fn test_paste_uses_configured_offset_and_missing_position() {
        let config = StoreConfig {
            paste_offset: [20.0, -10.0],
            ..StoreConfig::default()
        };
        let flow = FlowGraph::new("f", "F").with_node(FlowNode::new("n", "inject"));
        let mut store = FlowStore::with_flows(config, vec![flow]);
        store.copy_node("n");
        let id = store.paste_node().unwrap();
        let pasted = store.current_flow().unwrap().node(id.as_str()).unwrap();
        assert_eq!(pasted.position(), [20.0, -10.0]);
    }

    #[test]
    fn test_paste_twice_gives_distinct_ids() {
        let mut store = store();
        store.copy_node("A");
        let first = store.paste_node().unwrap();
        let second = store.paste_node().unwrap();
        assert_ne!(first, second);
        assert_eq!(store.current_flow().unwrap().node_count(), 5);
    }

    #[test]
    fn test_import_existing_replaces() {
        let mut store = store();
        store.import_flow(FlowGraph::new("f2", "Second"));
        assert_eq!(store.current_flow_id(), Some("f2"));

        let mut replacement = FlowGraph::new("f1", "Rewritten");
        replacement.info = "only one node".to_string();
        replacement.nodes.push(FlowNode::new("Z", "inject"));
        store.import_flow(replacement.clone());

        assert_eq!(store.flows().len(), 2);
        assert_eq!(store.current_flow_id(), Some("f1"));
        assert_eq!(store.current_flow().unwrap(), &replacement);
        assert_eq!(store.flows()[0].id, "f1");
    }

    #[test]
    fn test_import_new_appends() {
        let mut store = store();
        store.import_flow(FlowGraph::new("f9", "New"));
        assert_eq!(store.flows().len(), 2);
        assert_eq!(store.flows()[1].id, "f9");
        assert_eq!(store.current_flow_id(), Some("f9"));
    }

    #[test]
    fn test_import_json() {
        let mut store = FlowStore::default();
        store
            .import_flow_json(r#"{"id": "j1", "label": "From JSON", "nodes": [{"id": "n", "type": "inject", "wires": [[]]}]}"#)
            .unwrap();
        assert_eq!(store.current_flow().unwrap().label, "From JSON");

        assert!(matches!(
            store.import_flow_json(r#"{"id": "", "nodes": []}"#),
            Err(FlowFormatError::EmptyId)
        ));
        assert!(matches!(store.import_flow_json("not json"), Err(FlowFormatError::Json(_))));
        assert_eq!(store.flows().len(), 1);
    }

    #[test]
    fn test_export_falls_back_to_first() {
        let mut store = FlowStore::default();
        assert!(store.export_flow().is_none());
        assert_eq!(store.export_flow_json().unwrap(), None);

        store.import_flow(sample_flow());
        store.import_flow(FlowGraph::new("f2", "Second"));
        store.remove_flow("f2");
        assert!(store.current_flow().is_none());
        assert_eq!(store.export_flow().unwrap().id, "f1");

        let json = store.export_flow_json().unwrap().unwrap();
        let back: FlowGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_flow());
    }

    #[test]
    fn test_set_current_flow() {
        let mut store = store();
        store.import_flow(FlowGraph::new("f2", "Second"));
        store.set_current_flow("f1");
        assert_eq!(store.current_flow_id(), Some("f1"));
        store.set_current_flow("nope");
        assert_eq!(store.current_flow_id(), Some("f1"));
    }

    #[test]
    fn test_editing_flag_is_advisory() {
        let mut store = store();
        store.set_editing_config(true);
        assert!(store.is_editing_config());
        store.update_node("A", &NodePatch::new().name("still editable"));
        assert_eq!(store.current_flow().unwrap().node("A").unwrap().label(), "still editable");
    }

    #[test]
    fn test_simulation_drives_render() {
        let mut store = store();
        let registry = NodeRegistry::builtin();
        let start = Instant::now();

        store.start_simulation();
        store.add_simulation_event_at(SimulationEvent::new("A", json!({"status": "offline"})), start);
        store.add_simulation_event_at(SimulationEvent::new("B", json!({"status": "offline"})), start);

        let graph = store.render(&registry).unwrap();
        assert!(graph.edge("A-0-B").unwrap().animated);
        assert!(!graph.edge("A-0-C").unwrap().animated);
        assert!(graph.node("A").unwrap().active);
        assert!(!graph.node("C").unwrap().active);

        let window = store.config().activation_window();
        let expired = store.expire_active_nodes(start + window);
        assert_eq!(expired, vec![NodeId::from("A"), NodeId::from("B")]);
        let graph = store.render(&registry).unwrap();
        assert!(graph.edges.iter().all(|e| !e.animated));
    }

    #[test]
    fn test_stop_simulation_cancels_evictions() {
        let mut store = store();
        let start = Instant::now();
        store.start_simulation();
        store.add_simulation_event_at(SimulationEvent::new("A", json!(1)), start);
        store.stop_simulation();

        assert!(!store.simulation().is_active(&"A".into()));
        assert_eq!(store.simulation().event_count(), 1);
        assert!(store.expire_active_nodes(start + Duration::from_secs(60)).is_empty());

        store.start_simulation();
        assert_eq!(store.simulation().event_count(), 0);
    }

    #[test]
    fn test_event_log_capacity_from_config() {
        let config = StoreConfig {
            event_log_capacity: 3,
            ..StoreConfig::default()
        };
        let mut store = FlowStore::with_flows(config, vec![sample_flow()]);
        let now = Instant::now();
        for seq in 0..5 {
            store.add_simulation_event_at(SimulationEvent::with_timestamp("A", seq, json!(seq)), now);
        }
        let kept: Vec<u64> = store.simulation().events().map(SimulationEvent::timestamp).collect();
        assert_eq!(kept, vec![4, 3, 2]);
    }

    #[test]
    fn test_oversized_capacity_is_capped() {
        let config = StoreConfig {
            event_log_capacity: 500,
            ..StoreConfig::default()
        };
        let mut store = FlowStore::with_flows(config, vec![sample_flow()]);
        let now = Instant::now();
        for seq in 0..300 {
            store.add_simulation_event_at(SimulationEvent::with_timestamp("A", seq, json!(seq)), now);
        }
        assert_eq!(store.simulation().capacity(), 100);
        assert_eq!(store.simulation().event_count(), 100);
        assert_eq!(store.simulation().latest().unwrap().timestamp(), 299);
    }
}
