// SPDX-License-Identifier: MIT OR Apache-2.0
//! Simulation driver.
//!
//! Replays a scripted sequence of node events into a [`FlowStore`] on a
//! single-threaded event loop, ticking eviction on a fixed interval.

use flowdeck_graph::NodeId;
use flowdeck_store::{FlowStore, SimulationEvent};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};

/// One scripted event
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    /// Node the message passes through
    pub node: String,
    /// Wait before this step, in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
    /// Message snapshot
    #[serde(default)]
    pub message: Value,
}

/// Parse a JSON script
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(json)
}

/// What happened during a run
#[derive(Debug, Default)]
pub struct SimulationReport {
    /// Node IDs in the order events were recorded
    pub activations: Vec<NodeId>,
    /// Node IDs in the order they were evicted
    pub evictions: Vec<NodeId>,
}

fn expire(store: &mut FlowStore, report: &mut SimulationReport) {
    let expired = store.expire_active_nodes(std::time::Instant::now());
    report.evictions.extend(expired);
}

/// Run `script` against `store`, then wait until every node has been
/// evicted and stop the simulation
pub async fn run(store: &mut FlowStore, script: Vec<ScriptStep>, tick: Duration) -> SimulationReport {
    let mut report = SimulationReport::default();
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    store.start_simulation();

    let mut steps = script.into_iter();
    let mut pending = steps.next();
    let mut due = Instant::now() + pending.as_ref().map_or(Duration::ZERO, |s| Duration::from_millis(s.delay_ms));

    while pending.is_some() {
        tokio::select! {
            _ = sleep_until(due) => {
                if let Some(step) = pending.take() {
                    tracing::info!(node = %step.node, "Simulated message");
                    report.activations.push(NodeId::from(step.node.as_str()));
                    store.add_simulation_event(SimulationEvent::new(step.node, step.message));
                }
                pending = steps.next();
                if let Some(step) = &pending {
                    due = Instant::now() + Duration::from_millis(step.delay_ms);
                }
            }
            _ = ticker.tick() => expire(store, &mut report),
        }
    }

    while let Some(deadline) = store.simulation().next_deadline() {
        sleep_until(Instant::from_std(deadline)).await;
        expire(store, &mut report);
    }

    store.stop_simulation();
    report
}
