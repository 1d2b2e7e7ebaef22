//! Node runtime service
//!
//! Resolves a node type to its processor, validates inputs, runs the
//! processor and wraps the outcome in a [`NodeExecutionResult`].
//!
//! Input validation failures come back as `Ok` results with status
//! `failed`. Errors raised by `process` itself propagate as `Err`; the
//! orchestrator decides how to record them.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::NodeExecutionContext;
use crate::error::{EngineError, Result};
use crate::processor::{ControlSignal, NodeConfig, NodeInput, NodeOutput, ACTIVE_BRANCHES_FIELD};
use crate::registry::ProcessorRegistry;

/// Outcome of one node execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Success,
    Failed,
}

/// Snapshot of the run a result was produced in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultContext {
    pub workflow_id: String,
    pub pipeline_id: String,
    /// Nodes completed before this one
    pub completed_nodes: usize,
}

impl ResultContext {
    fn from_context(context: &NodeExecutionContext) -> Self {
        Self {
            workflow_id: context.workflow_id().to_string(),
            pipeline_id: context.pipeline_id().to_string(),
            completed_nodes: context.completed_nodes().len(),
        }
    }
}

/// Result of executing a single node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionResult {
    pub node_id: String,
    pub node_type: String,
    pub status: NodeStatus,
    pub output: NodeOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent in the processor, in milliseconds
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub context: ResultContext,
}

impl NodeExecutionResult {
    /// Build a failed result carrying an error payload
    pub fn failed(
        node_id: impl Into<String>,
        node_type: impl Into<String>,
        error: impl Into<String>,
        execution_time_ms: u64,
        context: &NodeExecutionContext,
    ) -> Self {
        let error = error.into();
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            status: NodeStatus::Failed,
            output: NodeOutput::empty()
                .with_value("success", false)
                .with_value("error", error.clone()),
            error: Some(error),
            execution_time_ms,
            timestamp: Utc::now(),
            context: ResultContext::from_context(context),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NodeStatus::Success
    }
}

/// Runs individual nodes through the processor registry
#[derive(Clone)]
pub struct NodeRuntimeService {
    registry: Arc<ProcessorRegistry>,
}

impl NodeRuntimeService {
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Execute one node
    pub async fn execute_node(
        &self,
        workflow_id: &str,
        node_id: &str,
        node_type: &str,
        input: NodeInput,
        config: NodeConfig,
        context: &NodeExecutionContext,
    ) -> Result<NodeExecutionResult> {
        let processor =
            self.registry
                .get_processor(node_type)
                .ok_or_else(|| EngineError::UnknownNodeType {
                    node_id: node_id.to_string(),
                    node_type: node_type.to_string(),
                })?;

        if !processor.validate_inputs(&input) {
            let missing: Vec<String> = processor
                .metadata()
                .required_inputs()
                .filter(|port| !input.has(port))
                .map(str::to_string)
                .collect();
            let message = if missing.is_empty() {
                format!("Input validation failed for node '{}'", node_id)
            } else {
                format!(
                    "Input validation failed for node '{}': missing {}",
                    node_id,
                    missing.join(", ")
                )
            };
            log::warn!("Workflow {}: {}", workflow_id, message);
            return Ok(NodeExecutionResult::failed(
                node_id, node_type, message, 0, context,
            ));
        }

        log::debug!(
            "Workflow {}: executing node '{}' ({})",
            workflow_id,
            node_id,
            node_type
        );

        let start = Instant::now();
        let output = processor.process(&input, &config).await?;
        let execution_time_ms = elapsed_ms(start);

        Ok(NodeExecutionResult {
            node_id: node_id.to_string(),
            node_type: node_type.to_string(),
            status: NodeStatus::Success,
            output: lift_active_branches(output),
            error: None,
            execution_time_ms,
            timestamp: Utc::now(),
            context: ResultContext::from_context(context),
        })
    }
}

/// Promote a bare `active_branches` data field into a control signal
fn lift_active_branches(mut output: NodeOutput) -> NodeOutput {
    if output.control.is_none() {
        output.control = output
            .data
            .get(ACTIVE_BRANCHES_FIELD)
            .and_then(ControlSignal::from_active_branches);
    }
    output
}

impl std::fmt::Debug for NodeRuntimeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRuntimeService")
            .field("node_types", &self.registry.node_types())
            .finish()
    }
}

/// Error message stored for a failed node, if any
pub fn error_of(result: &NodeExecutionResult) -> Option<&str> {
    result
        .error
        .as_deref()
        .or_else(|| result.output.get("error").and_then(Value::as_str))
}

/// Milliseconds since `start`, saturating at `u64::MAX`
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContextService;
    use crate::descriptor::{NodeCategory, PortDataType, PortMetadata, ProcessorMetadata};
    use serde_json::{json, Map};

    fn metadata(node_type: &str, required: &[&str]) -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: node_type.to_string(),
            category: NodeCategory::Processing,
            label: node_type.to_string(),
            description: String::new(),
            inputs: required
                .iter()
                .map(|p| PortMetadata::required(*p, *p, PortDataType::Any))
                .collect(),
            outputs: vec![],
            config: vec![],
        }
    }

    fn service() -> NodeRuntimeService {
        let mut registry = ProcessorRegistry::new();
        registry.register_fn(metadata("echo", &["text"]), |inputs, _| {
            Ok(inputs.values().clone())
        });
        registry.register_fn(metadata("legacy_gateway", &[]), |_, _| {
            let mut out = Map::new();
            out.insert("active_branches".to_string(), json!("approved"));
            Ok(out)
        });
        registry.register_fn(metadata("broken", &[]), |_, _| {
            Err(EngineError::failed("processor exploded"))
        });
        NodeRuntimeService::new(Arc::new(registry))
    }

    fn context() -> NodeExecutionContext {
        ExecutionContextService::new().create_context("wf", "pipe", Map::new())
    }

    fn input(text: &str) -> NodeInput {
        [("text".to_string(), json!(text))].into_iter().collect()
    }

    #[tokio::test]
    async fn test_execute_success() {
        let result = service()
            .execute_node("wf", "n1", "echo", input("hi"), NodeConfig::default(), &context())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.node_type, "echo");
        assert_eq!(result.output.get("text"), Some(&json!("hi")));
        assert_eq!(result.context.workflow_id, "wf");
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_is_a_failed_result() {
        let result = service()
            .execute_node(
                "wf",
                "n1",
                "echo",
                NodeInput::default(),
                NodeConfig::default(),
                &context(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, NodeStatus::Failed);
        assert!(error_of(&result).unwrap().contains("missing text"));
        assert_eq!(result.output.get("success"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_processor_error_propagates() {
        let err = service()
            .execute_node(
                "wf",
                "n1",
                "broken",
                NodeInput::default(),
                NodeConfig::default(),
                &context(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("processor exploded"));
    }

    #[tokio::test]
    async fn test_unknown_node_type() {
        let err = service()
            .execute_node(
                "wf",
                "n1",
                "missing",
                NodeInput::default(),
                NodeConfig::default(),
                &context(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownNodeType { .. }));
    }

    #[tokio::test]
    async fn test_legacy_active_branches_lifted() {
        let result = service()
            .execute_node(
                "wf",
                "gate",
                "legacy_gateway",
                NodeInput::default(),
                NodeConfig::default(),
                &context(),
            )
            .await
            .unwrap();

        assert_eq!(result.output.control, Some(ControlSignal::branch("approved")));
    }

    #[test]
    fn test_elapsed_ms_of_fresh_instant() {
        assert!(elapsed_ms(Instant::now()) < 1_000);
    }
}
