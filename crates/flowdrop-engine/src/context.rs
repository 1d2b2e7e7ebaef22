//! Execution context for a single orchestration run
//!
//! The context accumulates every successful node output keyed by node id.
//! Outputs are write-once: a recorded output is never replaced, so any node
//! later in the order can resolve inputs from any earlier producer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ContextError;
use crate::processor::NodeOutput;
use crate::types::NodeId;

/// Per-run accumulator of node outputs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionContext {
    workflow_id: String,
    pipeline_id: String,
    initial_data: Map<String, Value>,
    outputs: HashMap<NodeId, NodeOutput>,
    /// Node ids in the order their outputs were recorded
    completed: Vec<NodeId>,
}

impl NodeExecutionContext {
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn initial_data(&self) -> &Map<String, Value> {
        &self.initial_data
    }

    /// Recorded output of a workflow node
    pub fn node_output(&self, node_id: &str) -> Option<&NodeOutput> {
        self.outputs.get(node_id)
    }

    /// Check whether a node's output has been recorded
    pub fn has_output(&self, node_id: &str) -> bool {
        self.outputs.contains_key(node_id)
    }

    /// Nodes that completed, in completion order
    pub fn completed_nodes(&self) -> &[NodeId] {
        &self.completed
    }

    /// All recorded outputs as plain JSON, keyed by node id
    pub fn outputs_as_json(&self) -> Map<String, Value> {
        self.outputs
            .iter()
            .map(|(id, output)| (id.clone(), output.to_value()))
            .collect()
    }
}

/// Creates and updates execution contexts
#[derive(Debug, Clone, Default)]
pub struct ExecutionContextService;

impl ExecutionContextService {
    pub fn new() -> Self {
        Self
    }

    /// Create an empty context carrying `initial_data`
    pub fn create_context(
        &self,
        workflow_id: impl Into<String>,
        pipeline_id: impl Into<String>,
        initial_data: Map<String, Value>,
    ) -> NodeExecutionContext {
        NodeExecutionContext {
            workflow_id: workflow_id.into(),
            pipeline_id: pipeline_id.into(),
            initial_data,
            outputs: HashMap::new(),
            completed: Vec::new(),
        }
    }

    /// Record a node's output, returning the updated context
    pub fn update_context(
        &self,
        mut context: NodeExecutionContext,
        node_id: &str,
        output: NodeOutput,
    ) -> Result<NodeExecutionContext, ContextError> {
        if context.outputs.contains_key(node_id) {
            return Err(ContextError::OutputAlreadyRecorded(node_id.to_string()));
        }
        context.outputs.insert(node_id.to_string(), output);
        context.completed.push(node_id.to_string());
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn initial() -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("text".to_string(), json!("hello"));
        data
    }

    #[test]
    fn test_create_context_keeps_initial_data_apart() {
        let service = ExecutionContextService::new();
        let context = service.create_context("wf", "pipe", initial());

        assert_eq!(context.workflow_id(), "wf");
        assert_eq!(context.pipeline_id(), "pipe");
        assert_eq!(context.initial_data().get("text"), Some(&json!("hello")));
        assert!(context.outputs_as_json().is_empty());
        assert!(context.completed_nodes().is_empty());
    }

    #[test]
    fn test_any_node_id_can_record_output() {
        let service = ExecutionContextService::new();
        let context = service.create_context("wf", "pipe", initial());
        let context = service
            .update_context(context, "__start__", NodeOutput::empty().with_value("text", "hi"))
            .unwrap();

        assert_eq!(context.node_output("__start__").unwrap().get("text"), Some(&json!("hi")));
        assert_eq!(context.initial_data().get("text"), Some(&json!("hello")));
    }

    #[test]
    fn test_update_preserves_previous_outputs() {
        let service = ExecutionContextService::new();
        let context = service.create_context("wf", "pipe", initial());

        let context = service
            .update_context(context, "a", NodeOutput::empty().with_value("n", 1))
            .unwrap();
        let context = service
            .update_context(context, "b", NodeOutput::empty().with_value("n", 2))
            .unwrap();

        assert_eq!(context.node_output("a").unwrap().get("n"), Some(&json!(1)));
        assert_eq!(context.node_output("b").unwrap().get("n"), Some(&json!(2)));
        assert!(!context.has_output("c"));
        assert_eq!(context.completed_nodes(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_update_rejects_overwrite() {
        let service = ExecutionContextService::new();
        let context = service.create_context("wf", "pipe", Map::new());
        let context = service
            .update_context(context, "a", NodeOutput::empty().with_value("n", 1))
            .unwrap();

        let err = service
            .update_context(context, "a", NodeOutput::empty().with_value("n", 2))
            .unwrap_err();
        assert_eq!(err, ContextError::OutputAlreadyRecorded("a".to_string()));
    }

    #[test]
    fn test_outputs_as_json() {
        let service = ExecutionContextService::new();
        let context = service.create_context("wf", "pipe", Map::new());
        let context = service
            .update_context(context, "a", NodeOutput::empty().with_value("n", 1))
            .unwrap();

        let json = context.outputs_as_json();
        assert_eq!(json["a"], json!({"n": 1}));
    }
}
