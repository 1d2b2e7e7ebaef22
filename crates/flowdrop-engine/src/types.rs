//! Core types for workflow graphs
//!
//! These types mirror the JSON the flow builder emits: a list of nodes
//! plus either handle-annotated `edges` or legacy `connections`.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a port
pub type PortId = String;

/// Input port id that marks an edge as a control-flow (trigger) edge
pub const TRIGGER_PORT: &str = "trigger";

/// Port name used for inputs that arrive without handle information
pub const DEFAULT_PORT: &str = "default";

const OUTPUT_MARKER: &str = "-output-";
const INPUT_MARKER: &str = "-input-";

/// A node instance in a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Processor id this node runs (e.g. "if_else")
    #[serde(rename = "type")]
    pub node_type: String,
    /// Static configuration for this instance
    #[serde(default)]
    pub config: serde_json::Value,
    /// Human-readable label shown in the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl WorkflowNode {
    /// Create a node with an empty configuration
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: serde_json::Value::Null,
            label: None,
        }
    }

    /// Attach a configuration object
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// An edge between two nodes, optionally carrying port handles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    /// Unique identifier for this edge
    #[serde(default)]
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Source handle, e.g. `if_else_1-output-true`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Target handle, e.g. `process_a-input-trigger`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// A legacy connection without handle semantics (always a data edge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
}

/// A complete workflow definition as supplied by the editor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    /// Unique identifier for this workflow
    pub id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Nodes in declaration order
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Handle-annotated edges
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<WorkflowEdge>,
    /// Legacy connections
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<Connection>,
}

impl Workflow {
    /// Create a new empty workflow
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All edges and connections, with handles decoded into ports.
    ///
    /// Edges come first in declaration order, followed by connections.
    /// Edges without an id get a positional one.
    pub fn resolved_edges(&self) -> Vec<ResolvedEdge> {
        let edges = self.edges.iter().enumerate().map(|(index, edge)| {
            let source_port = edge
                .source_handle
                .as_deref()
                .and_then(|h| parse_handle(h, &edge.source, OUTPUT_MARKER));
            let target_port = edge
                .target_handle
                .as_deref()
                .and_then(|h| parse_handle(h, &edge.target, INPUT_MARKER));
            let kind = if target_port.as_deref() == Some(TRIGGER_PORT) {
                EdgeKind::Trigger
            } else {
                EdgeKind::Data
            };
            ResolvedEdge {
                id: if edge.id.is_empty() {
                    format!("edge-{}", index)
                } else {
                    edge.id.clone()
                },
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_port,
                target_port,
                kind,
            }
        });

        let connections = self
            .connections
            .iter()
            .enumerate()
            .map(|(index, conn)| ResolvedEdge {
                id: format!("connection-{}", index),
                source: conn.source.clone(),
                target: conn.target.clone(),
                source_port: None,
                target_port: None,
                kind: EdgeKind::Data,
            });

        edges.chain(connections).collect()
    }
}

/// Whether an edge carries data or gates execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Output value flows into the target's inputs
    Data,
    /// Target only runs when this edge is active
    Trigger,
}

/// An edge with its handles decoded into port ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Output port (or branch name) on the source node
    pub source_port: Option<PortId>,
    /// Input port on the target node
    pub target_port: Option<PortId>,
    pub kind: EdgeKind,
}

impl ResolvedEdge {
    /// Check if this edge gates execution of its target
    pub fn is_trigger(&self) -> bool {
        self.kind == EdgeKind::Trigger
    }
}

/// Decode a `<nodeId>-output-<portId>` / `<nodeId>-input-<portId>` handle.
///
/// Node ids may themselves contain the marker text, so the known node id
/// prefix is tried first. Handles without a marker are taken as the port id.
fn parse_handle(handle: &str, node_id: &str, marker: &str) -> Option<PortId> {
    if handle.is_empty() {
        return None;
    }

    let port = handle
        .strip_prefix(node_id)
        .and_then(|rest| rest.strip_prefix(marker))
        .or_else(|| handle.rsplit_once(marker).map(|(_, port)| port))
        .unwrap_or(handle);

    if port.is_empty() {
        None
    } else {
        Some(port.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handle_with_node_prefix() {
        assert_eq!(
            parse_handle("if-else-1-output-true", "if-else-1", OUTPUT_MARKER),
            Some("true".to_string())
        );
        assert_eq!(
            parse_handle("proc-input-trigger", "proc", INPUT_MARKER),
            Some("trigger".to_string())
        );
    }

    #[test]
    fn test_parse_handle_without_marker() {
        assert_eq!(parse_handle("text", "n1", OUTPUT_MARKER), Some("text".to_string()));
        assert_eq!(parse_handle("", "n1", OUTPUT_MARKER), None);
    }

    #[test]
    fn test_parse_handle_foreign_prefix() {
        // Handle written against a renamed node still yields its port
        assert_eq!(
            parse_handle("old-id-output-false", "new-id", OUTPUT_MARKER),
            Some("false".to_string())
        );
    }

    #[test]
    fn test_resolved_edges_classify_trigger() {
        let mut workflow = Workflow::new("wf", "Test");
        workflow.nodes.push(WorkflowNode::new("gate", "if_else"));
        workflow.nodes.push(WorkflowNode::new("a", "text_output"));
        workflow.edges.push(WorkflowEdge {
            id: "e1".to_string(),
            source: "gate".to_string(),
            target: "a".to_string(),
            source_handle: Some("gate-output-true".to_string()),
            target_handle: Some("a-input-trigger".to_string()),
        });
        workflow.connections.push(Connection {
            source: "gate".to_string(),
            target: "a".to_string(),
        });

        let edges = workflow.resolved_edges();
        assert_eq!(edges.len(), 2);
        assert!(edges[0].is_trigger());
        assert_eq!(edges[0].source_port.as_deref(), Some("true"));
        assert_eq!(edges[1].kind, EdgeKind::Data);
        assert_eq!(edges[1].id, "connection-0");
        assert!(edges[1].target_port.is_none());
    }

    #[test]
    fn test_workflow_json_shape() {
        let json = serde_json::json!({
            "id": "wf-1",
            "nodes": [
                {"id": "in", "type": "text_input", "config": {"defaultText": "hi"}},
                {"id": "out", "type": "text_output"}
            ],
            "edges": [
                {"id": "e1", "source": "in", "target": "out",
                 "sourceHandle": "in-output-text", "targetHandle": "out-input-text"}
            ]
        });
        let workflow: Workflow = serde_json::from_value(json).unwrap();
        assert_eq!(workflow.nodes[0].node_type, "text_input");
        assert_eq!(workflow.nodes[1].config, serde_json::Value::Null);
        assert_eq!(workflow.edges[0].target_handle.as_deref(), Some("out-input-text"));
        assert!(workflow.connections.is_empty());
    }
}
