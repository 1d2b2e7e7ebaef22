//! Request and response types for orchestration runs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{MissingDependencyPolicy, OrchestratorConfig};
use crate::runtime::NodeExecutionResult;
use crate::types::{NodeId, Workflow};

/// Lifecycle of one run
///
/// `Pending -> Compiling -> Executing -> Completed | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    Pending,
    Compiling,
    Executing,
    Completed,
    Failed,
}

impl OrchestrationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Per-request overrides of [`OrchestratorConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrchestrationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_error: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_dependency_policy: Option<MissingDependencyPolicy>,
}

impl OrchestrationOptions {
    /// Apply these overrides on top of an orchestrator's defaults
    pub fn resolve(&self, defaults: &OrchestratorConfig) -> OrchestratorConfig {
        OrchestratorConfig {
            continue_on_error: self.continue_on_error.unwrap_or(defaults.continue_on_error),
            missing_dependency_policy: self
                .missing_dependency_policy
                .unwrap_or(defaults.missing_dependency_policy),
        }
    }
}

/// Everything needed to run a workflow once
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationRequest {
    pub workflow_id: String,
    pub pipeline_id: String,
    pub workflow: Workflow,
    #[serde(default)]
    pub initial_data: Map<String, Value>,
    #[serde(default)]
    pub options: OrchestrationOptions,
}

impl OrchestrationRequest {
    /// Request using the workflow's own id and an empty pipeline id
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow_id: workflow.id.clone(),
            pipeline_id: String::new(),
            workflow,
            initial_data: Map::new(),
            options: OrchestrationOptions::default(),
        }
    }

    pub fn with_pipeline_id(mut self, pipeline_id: impl Into<String>) -> Self {
        self.pipeline_id = pipeline_id.into();
        self
    }

    pub fn with_initial_data(mut self, initial_data: Map<String, Value>) -> Self {
        self.initial_data = initial_data;
        self
    }

    pub fn with_options(mut self, options: OrchestrationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Run summary attached to every response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationMetadata {
    pub orchestrator_type: String,
    pub total_nodes: usize,
    /// Number of node results recorded (successful and failed)
    pub nodes_executed: usize,
    pub nodes_skipped: usize,
    pub skipped_node_ids: Vec<NodeId>,
    pub nodes_failed: usize,
    pub failed_node_ids: Vec<NodeId>,
    /// Run-level error (compilation failure or abort reason)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResponse {
    pub execution_id: String,
    pub status: OrchestrationStatus,
    /// Node results in execution order
    pub results: Vec<NodeExecutionResult>,
    pub execution_time_ms: u64,
    pub metadata: OrchestrationMetadata,
}

impl OrchestrationResponse {
    pub fn result_for(&self, node_id: &str) -> Option<&NodeExecutionResult> {
        self.results.iter().find(|r| r.node_id == node_id)
    }

    pub fn was_skipped(&self, node_id: &str) -> bool {
        self.metadata.skipped_node_ids.iter().any(|id| id == node_id)
    }

    /// Node ids in the order they produced results
    pub fn executed_node_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.node_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_override_defaults() {
        let defaults = OrchestratorConfig::default();
        let options = OrchestrationOptions {
            continue_on_error: Some(false),
            missing_dependency_policy: None,
        };
        let resolved = options.resolve(&defaults);
        assert!(!resolved.continue_on_error);
        assert_eq!(resolved.missing_dependency_policy, MissingDependencyPolicy::Fail);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: OrchestrationRequest = serde_json::from_value(serde_json::json!({
            "workflowId": "wf",
            "pipelineId": "p1",
            "workflow": {"id": "wf", "nodes": [], "edges": []}
        }))
        .unwrap();
        assert_eq!(request.pipeline_id, "p1");
        assert!(request.initial_data.is_empty());
        assert_eq!(request.options, OrchestrationOptions::default());
    }

    #[test]
    fn test_status_terminal() {
        assert!(OrchestrationStatus::Completed.is_terminal());
        assert!(!OrchestrationStatus::Executing.is_terminal());
    }
}
