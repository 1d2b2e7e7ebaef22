//! Fluent builder for workflow graphs
//!
//! Provides a compact API for constructing workflows programmatically,
//! mostly used by tests and host applications that generate graphs.

use crate::types::{Connection, Workflow, WorkflowEdge, WorkflowNode, TRIGGER_PORT};

/// Fluent builder for constructing workflows
///
/// # Example
///
/// ```ignore
/// let workflow = WorkflowBuilder::new("wf-1", "Greeting")
///     .add_node("input", "text_input")
///     .with_config(serde_json::json!({"defaultText": "hello"}))
///     .add_node("output", "text_output")
///     .add_edge("input", "text", "output", "text")
///     .build();
/// ```
pub struct WorkflowBuilder {
    id: String,
    name: String,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    connections: Vec<Connection>,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            connections: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Add a node to the workflow
    pub fn add_node(mut self, id: impl Into<String>, node_type: impl Into<String>) -> Self {
        self.nodes.push(WorkflowNode::new(id, node_type));
        self
    }

    /// Set configuration on the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.config = config;
        }
        self
    }

    /// Add a data edge between two ports, writing handles in editor form
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_port: &str,
        target: impl Into<String>,
        target_port: &str,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        self.edge_counter += 1;
        self.edges.push(WorkflowEdge {
            id: format!("edge-{}", self.edge_counter),
            source_handle: Some(format!("{}-output-{}", source, source_port)),
            target_handle: Some(format!("{}-input-{}", target, target_port)),
            source,
            target,
        });
        self
    }

    /// Add a trigger edge leaving `source` through `branch`
    pub fn add_trigger(
        self,
        source: impl Into<String>,
        branch: &str,
        target: impl Into<String>,
    ) -> Self {
        self.add_edge(source, branch, target, TRIGGER_PORT)
    }

    /// Add a legacy handle-less connection
    pub fn connect(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.connections.push(Connection {
            source: source.into(),
            target: target.into(),
        });
        self
    }

    /// Build the workflow without validation
    pub fn build(self) -> Workflow {
        Workflow {
            id: self.id,
            name: self.name,
            nodes: self.nodes,
            edges: self.edges,
            connections: self.connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;

    #[test]
    fn test_builder_writes_editor_handles() {
        let workflow = WorkflowBuilder::new("wf", "Test")
            .add_node("gate", "if_else")
            .with_config(serde_json::json!({"matchText": "hello"}))
            .add_node("a", "text_output")
            .add_trigger("gate", "true", "a")
            .build();

        assert_eq!(workflow.nodes[0].config["matchText"], "hello");
        assert_eq!(
            workflow.edges[0].source_handle.as_deref(),
            Some("gate-output-true")
        );

        let resolved = workflow.resolved_edges();
        assert_eq!(resolved[0].kind, EdgeKind::Trigger);
    }

    #[test]
    fn test_builder_connections() {
        let workflow = WorkflowBuilder::new("wf", "Legacy")
            .add_node("a", "calculator")
            .add_node("b", "calculator")
            .connect("a", "b")
            .build();

        assert!(workflow.edges.is_empty());
        assert_eq!(workflow.connections.len(), 1);
    }
}
