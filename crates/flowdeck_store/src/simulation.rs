// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulation overlay: event log and active-node highlighting.
//!
//! Each active node holds exactly one eviction deadline. Activating a node
//! that is already active cancels its pending deadline and schedules a new
//! one, so a burst of events keeps the node lit until the window after the
//! last event. Deadlines fire only when the host calls
//! [`SimulationState::expire`] from its event loop.

use crate::config::MAX_EVENT_LOG_CAPACITY;
use flowdeck_graph::{ActiveNodes, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A simulated message passing through a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    node_id: NodeId,
    timestamp: u64,
    message: Value,
}

impl SimulationEvent {
    /// Create an event stamped with the current wall-clock time
    pub fn new(node_id: impl Into<NodeId>, message: Value) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self::with_timestamp(node_id, timestamp, message)
    }

    /// Create an event with an explicit timestamp (milliseconds since epoch)
    pub fn with_timestamp(node_id: impl Into<NodeId>, timestamp: u64, message: Value) -> Self {
        Self {
            node_id: node_id.into(),
            timestamp,
            message,
        }
    }

    /// Node the message passed through
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Milliseconds since epoch
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Message snapshot
    pub fn message(&self) -> &Value {
        &self.message
    }
}

/// Insertion-ordered set of active nodes, each with one eviction deadline
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationScheduler {
    window: Duration,
    deadlines: IndexMap<NodeId, Instant>,
}

impl ActivationScheduler {
    /// Create a scheduler that keeps nodes active for `window`
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: IndexMap::new(),
        }
    }

    /// Activate a node at `now`.
    ///
    /// Returns true if the node was not active before. An already active
    /// node keeps its place in the set and gets a fresh deadline.
    pub fn activate(&mut self, id: NodeId, now: Instant) -> bool {
        let deadline = now + self.window;
        match self.deadlines.get_mut(&id) {
            Some(existing) => {
                *existing = deadline;
                false
            }
            None => {
                self.deadlines.insert(id, deadline);
                true
            }
        }
    }

    /// Cancel a node's pending eviction and deactivate it now
    pub fn cancel(&mut self, id: &NodeId) -> bool {
        self.deadlines.shift_remove(id).is_some()
    }

    /// Cancel every pending eviction
    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    /// Deactivate every node whose deadline is at or before `now`.
    /// Returns the evicted IDs in activation order.
    pub fn expire(&mut self, now: Instant) -> Vec<NodeId> {
        let mut expired = Vec::new();
        self.deadlines.retain(|id, deadline| {
            if *deadline <= now {
                expired.push(id.clone());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Deadline of one node
    pub fn deadline(&self, id: &NodeId) -> Option<Instant> {
        self.deadlines.get(id).copied()
    }

    /// Active node IDs in activation order
    pub fn active_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.deadlines.keys()
    }

    /// Number of active nodes
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Check if no node is active
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Activation window
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl ActiveNodes for ActivationScheduler {
    fn is_active(&self, id: &NodeId) -> bool {
        self.deadlines.contains_key(id)
    }
}

/// Simulation state for one store
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    running: bool,
    capacity: usize,
    events: VecDeque<SimulationEvent>,
    active: ActivationScheduler,
}

impl SimulationState {
    /// Create a stopped simulation with an empty log.
    ///
    /// `capacity` is clamped to `1..=MAX_EVENT_LOG_CAPACITY`.
    pub fn new(capacity: usize, window: Duration) -> Self {
        let clamped = capacity.clamp(1, MAX_EVENT_LOG_CAPACITY);
        if clamped != capacity {
            tracing::warn!("Event log capacity {capacity} out of range, using {clamped}");
        }
        Self {
            running: false,
            capacity: clamped,
            events: VecDeque::new(),
            active: ActivationScheduler::new(window),
        }
    }

    /// Clear log and active set, then mark running
    pub fn start(&mut self) {
        self.events.clear();
        self.active.cancel_all();
        self.running = true;
    }

    /// Mark stopped and clear the active set, keeping the log
    pub fn stop(&mut self) {
        self.running = false;
        self.active.cancel_all();
    }

    /// Log an event and activate its node at `now`.
    /// Returns true if the node became active.
    pub fn record(&mut self, event: SimulationEvent, now: Instant) -> bool {
        let node_id = event.node_id().clone();
        self.events.push_front(event);
        self.events.truncate(self.capacity);
        self.active.activate(node_id, now)
    }

    /// Deactivate one node immediately, dropping its pending eviction
    pub fn deactivate(&mut self, id: &NodeId) -> bool {
        self.active.cancel(id)
    }

    /// Evict nodes whose window has passed
    pub fn expire(&mut self, now: Instant) -> Vec<NodeId> {
        self.active.expire(now)
    }

    /// Check if the simulation is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Events, newest first
    pub fn events(&self) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter()
    }

    /// Most recent event
    pub fn latest(&self) -> Option<&SimulationEvent> {
        self.events.front()
    }

    /// Number of logged events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Maximum number of logged events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Active nodes and their deadlines
    pub fn active(&self) -> &ActivationScheduler {
        &self.active
    }

    /// Active node IDs in activation order
    pub fn active_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.active.active_nodes()
    }

    /// Earliest pending eviction
    pub fn next_deadline(&self) -> Option<Instant> {
        self.active.next_deadline()
    }
}

impl ActiveNodes for SimulationState {
    fn is_active(&self, id: &NodeId) -> bool {
        self.active.is_active(id)
    }
}
