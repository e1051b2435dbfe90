// SPDX-License-Identifier: MIT OR Apache-2.0
//! One-shot commands: palette listing, rendering and validation.

use crate::error::{read_file, CliError, Result};
use flowdeck_graph::{parse_flow, validate_flow, FlowIssue, NodeId, NodeRegistry, RenderGraph, Severity};
use flowdeck_store::{FlowStore, StoreConfig};
use std::fmt::Write as _;
use std::path::Path;

/// Load a flow file into a fresh store
pub fn load_store(path: &Path, config: StoreConfig) -> Result<FlowStore> {
    let json = read_file(path)?;
    let mut store = FlowStore::new(config);
    store.import_flow_json(&json)?;
    Ok(store)
}

/// Describe the palette grouped by category
pub fn describe_types(registry: &NodeRegistry) -> String {
    let mut out = String::new();
    for (category, color) in registry.category_colors() {
        let _ = writeln!(out, "{} ({color})", category.display_name());
        for node_type in registry.types_in_category(category) {
            let _ = writeln!(
                out,
                "  {:<18} in:{} out:{}  {}",
                node_type.id, node_type.inputs, node_type.outputs, node_type.description
            );
        }
    }
    out
}

/// Render the flow in `path` with the given nodes marked active
pub fn render(path: &Path, active: &[String], registry: &NodeRegistry, config: StoreConfig) -> Result<RenderGraph> {
    let store = load_store(path, config)?;
    let active: Vec<NodeId> = active.iter().map(|id| NodeId::from(id.as_str())).collect();
    let graph = store
        .export_flow()
        .map(|flow| parse_flow(flow, &active, registry))
        .unwrap_or_default();
    tracing::info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "Rendered flow");
    Ok(graph)
}

/// Pretty JSON for command output
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(CliError::Output)
}

/// Validate the flow in `path`
pub fn validate(path: &Path, registry: &NodeRegistry, config: StoreConfig) -> Result<Vec<FlowIssue>> {
    let store = load_store(path, config)?;
    let issues = store
        .export_flow()
        .map(|flow| validate_flow(flow, registry))
        .unwrap_or_default();
    Ok(issues)
}

/// One line per issue, prefixed by severity
pub fn format_issues(issues: &[FlowIssue]) -> String {
    let mut out = String::new();
    for issue in issues {
        let level = match issue.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let _ = writeln!(out, "{level}: {issue}");
    }
    out
}
