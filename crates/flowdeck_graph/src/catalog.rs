// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node palette for the monitoring console.
//!
//! Covers the general-purpose flow nodes plus the monitoring-specific ones
//! that talk to devices, exporters, alert jobs and SMS templates.

use crate::registry::{NodeCategory, NodeRegistry, NodeType};
use serde_json::{json, Map, Value};

fn defaults(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn node_type(
    id: &str,
    name: &str,
    category: NodeCategory,
    description: &str,
    inputs: usize,
    outputs: usize,
    color: &str,
    icon: &str,
    config: Value,
) -> NodeType {
    NodeType {
        id: id.to_string(),
        name: name.to_string(),
        category,
        description: description.to_string(),
        defaults: defaults(config),
        inputs,
        outputs,
        color: color.to_string(),
        icon: icon.to_string(),
    }
}

/// Create the built-in node registry
pub fn create_builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // ========================================================================
    // Common
    // ========================================================================

    registry.register(node_type(
        "inject",
        "Inject",
        NodeCategory::Common,
        "Injects a message manually or on an interval",
        0,
        1,
        "#a6bbcf",
        "inject",
        json!({"payload": "", "payloadType": "date", "repeat": "", "once": false}),
    ));

    registry.register(node_type(
        "debug",
        "Debug",
        NodeCategory::Common,
        "Shows messages in the debug sidebar",
        1,
        0,
        "#87a980",
        "debug",
        json!({"active": true, "complete": "payload", "console": false}),
    ));

    registry.register(node_type(
        "comment",
        "Comment",
        NodeCategory::Common,
        "Free-text annotation",
        0,
        0,
        "#ffffff",
        "comment",
        json!({"info": ""}),
    ));

    // ========================================================================
    // Function
    // ========================================================================

    registry.register(node_type(
        "function",
        "Function",
        NodeCategory::Function,
        "Runs a script against each message",
        1,
        1,
        "#fdd0a2",
        "function",
        json!({"func": "return msg;", "outputs": 1}),
    ));

    registry.register(node_type(
        "switch",
        "Switch",
        NodeCategory::Function,
        "Routes messages by property rules",
        1,
        2,
        "#e2d96e",
        "switch",
        json!({"property": "payload", "rules": [], "checkall": "true"}),
    ));

    registry.register(node_type(
        "change",
        "Change",
        NodeCategory::Function,
        "Sets, changes or deletes message properties",
        1,
        1,
        "#e2d96e",
        "swap",
        json!({"rules": []}),
    ));

    registry.register(node_type(
        "delay",
        "Delay",
        NodeCategory::Function,
        "Delays or rate-limits messages",
        1,
        1,
        "#e6e0f8",
        "timer",
        json!({"pauseType": "delay", "timeout": "5", "timeoutUnits": "seconds"}),
    ));

    registry.register(node_type(
        "template",
        "Template",
        NodeCategory::Function,
        "Renders a mustache template into a message property",
        1,
        1,
        "#ddcc99",
        "template",
        json!({"field": "payload", "template": ""}),
    ));

    // ========================================================================
    // Network
    // ========================================================================

    registry.register(node_type(
        "mqtt in",
        "MQTT In",
        NodeCategory::Network,
        "Subscribes to an MQTT topic",
        0,
        1,
        "#d8bfd8",
        "bridge",
        json!({"topic": "", "qos": "2", "datatype": "auto"}),
    ));

    registry.register(node_type(
        "mqtt out",
        "MQTT Out",
        NodeCategory::Network,
        "Publishes to an MQTT topic",
        1,
        0,
        "#d8bfd8",
        "bridge",
        json!({"topic": "", "qos": "", "retain": ""}),
    ));

    registry.register(node_type(
        "http request",
        "HTTP Request",
        NodeCategory::Network,
        "Calls an HTTP endpoint",
        1,
        1,
        "#e7e7ae",
        "white-globe",
        json!({"method": "GET", "url": "", "ret": "txt"}),
    ));

    registry.register(node_type(
        "http response",
        "HTTP Response",
        NodeCategory::Network,
        "Replies to a request from an HTTP in node",
        1,
        0,
        "#e7e7ae",
        "white-globe",
        json!({"statusCode": "", "headers": {}}),
    ));

    registry.register(node_type(
        "websocket out",
        "WebSocket Out",
        NodeCategory::Network,
        "Pushes messages to connected websocket clients",
        1,
        0,
        "#d7d7a0",
        "white-globe",
        json!({"path": "/ws/events"}),
    ));

    // ========================================================================
    // Monitoring
    // ========================================================================

    registry.register(node_type(
        "device status",
        "Device Status",
        NodeCategory::Monitoring,
        "Emits online, offline and degraded transitions for a device",
        0,
        3,
        "#3fadb5",
        "router",
        json!({"device": "", "pollInterval": 60}),
    ));

    registry.register(node_type(
        "metric threshold",
        "Metric Threshold",
        NodeCategory::Monitoring,
        "Splits metric samples into within and beyond threshold",
        1,
        2,
        "#3fadb5",
        "gauge",
        json!({"metric": "", "operator": "gt", "threshold": 0}),
    ));

    registry.register(node_type(
        "exporter scrape",
        "Exporter Scrape",
        NodeCategory::Monitoring,
        "Scrapes a Prometheus exporter target",
        1,
        1,
        "#5a8fc7",
        "database",
        json!({"exporter": "", "timeout": 10}),
    ));

    registry.register(node_type(
        "alert job",
        "Alert Job",
        NodeCategory::Monitoring,
        "Raises or resolves an alert job",
        1,
        1,
        "#e06c5a",
        "alert",
        json!({"job": "", "severity": "warning"}),
    ));

    registry.register(node_type(
        "sms command",
        "SMS Command",
        NodeCategory::Monitoring,
        "Sends an SMS command template to a device",
        1,
        1,
        "#e06c5a",
        "envelope",
        json!({"template": "", "recipient": ""}),
    ));

    registry
}
