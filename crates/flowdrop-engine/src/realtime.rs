//! Real-time execution monitoring
//!
//! The orchestrator reports run and node progress to a [`RealTimeManager`].
//! Managers are fire-and-forget sinks: the orchestrator logs their errors
//! and carries on.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestration::OrchestrationStatus;

/// Error reported by a monitoring sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    /// The execution was never registered with `start_monitoring`
    #[error("Execution '{0}' is not being monitored")]
    UnknownExecution(String),

    /// The underlying transport is gone
    #[error("Monitoring channel closed")]
    ChannelClosed,

    #[error("Monitoring error: {0}")]
    Other(String),
}

/// Run information passed to `start_monitoring`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringInfo {
    pub workflow_id: String,
    pub pipeline_id: String,
    pub orchestrator_type: String,
    pub total_nodes: usize,
}

/// Status of a single node as seen by monitors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRunStatus {
    Running,
    Completed,
    Failed,
    Skipped,
}

impl std::fmt::Display for NodeRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Payload of `update_execution_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: NodeRunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(status: NodeRunStatus) -> Self {
        Self {
            status,
            node_type: None,
            execution_time_ms: None,
            error: None,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn running(node_type: &str) -> Self {
        Self::new(NodeRunStatus::Running).with_node_type(node_type)
    }

    pub fn completed(node_type: &str, execution_time_ms: u64) -> Self {
        Self {
            execution_time_ms: Some(execution_time_ms),
            ..Self::new(NodeRunStatus::Completed).with_node_type(node_type)
        }
    }

    pub fn failed(node_type: &str, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(NodeRunStatus::Failed).with_node_type(node_type)
        }
    }

    pub fn skipped(node_type: &str, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(NodeRunStatus::Skipped).with_node_type(node_type)
        }
    }

    fn with_node_type(mut self, node_type: &str) -> Self {
        self.node_type = Some(node_type.to_string());
        self
    }
}

/// Sink for run and node progress
///
/// Implementations must be cheap and non-blocking; they are called inline
/// from the orchestration loop.
pub trait RealTimeManager: Send + Sync {
    /// A run has started executing nodes
    fn start_monitoring(&self, execution_id: &str, info: &MonitoringInfo)
        -> Result<(), MonitorError>;

    /// A node changed status
    fn update_execution_status(
        &self,
        execution_id: &str,
        node_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), MonitorError>;

    /// A run reached a terminal status
    fn finish_monitoring(
        &self,
        _execution_id: &str,
        _status: OrchestrationStatus,
    ) -> Result<(), MonitorError> {
        Ok(())
    }
}

/// A manager that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRealTimeManager;

impl RealTimeManager for NullRealTimeManager {
    fn start_monitoring(&self, _: &str, _: &MonitoringInfo) -> Result<(), MonitorError> {
        Ok(())
    }

    fn update_execution_status(&self, _: &str, _: &str, _: &StatusUpdate) -> Result<(), MonitorError> {
        Ok(())
    }
}

/// A manager that forwards every update to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRealTimeManager;

impl RealTimeManager for LoggingRealTimeManager {
    fn start_monitoring(&self, execution_id: &str, info: &MonitoringInfo) -> Result<(), MonitorError> {
        log::info!(
            "[{}] monitoring workflow '{}' ({} nodes, pipeline '{}')",
            execution_id,
            info.workflow_id,
            info.total_nodes,
            info.pipeline_id
        );
        Ok(())
    }

    fn update_execution_status(
        &self,
        execution_id: &str,
        node_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), MonitorError> {
        match (&update.error, &update.reason) {
            (Some(error), _) => {
                log::warn!("[{}] node '{}' {}: {}", execution_id, node_id, update.status, error)
            }
            (None, Some(reason)) => {
                log::info!("[{}] node '{}' {} ({})", execution_id, node_id, update.status, reason)
            }
            (None, None) => log::info!("[{}] node '{}' {}", execution_id, node_id, update.status),
        }
        Ok(())
    }

    fn finish_monitoring(
        &self,
        execution_id: &str,
        status: OrchestrationStatus,
    ) -> Result<(), MonitorError> {
        log::info!("[{}] run finished: {:?}", execution_id, status);
        Ok(())
    }
}

/// Summary returned by [`InMemoryRealTimeManager::execution_status`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatusReport {
    pub execution_id: String,
    pub status: ExecutionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub workflow_id: String,
    pub pipeline_id: String,
    pub state: OrchestrationStatus,
    pub total_nodes: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Per-node view returned by [`InMemoryRealTimeManager::execution_metrics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatusReport {
    pub execution_id: String,
    pub node_statuses: BTreeMap<String, StatusUpdate>,
}

/// One recorded status change
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    pub node_id: String,
    pub update: StatusUpdate,
}

#[derive(Debug, Clone)]
struct ExecutionRecord {
    info: MonitoringInfo,
    state: OrchestrationStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    node_statuses: BTreeMap<String, StatusUpdate>,
    history: Vec<RecordedUpdate>,
}

/// A manager that keeps every run in memory
///
/// Useful for tests and for hosts that poll execution status.
#[derive(Debug, Default)]
pub struct InMemoryRealTimeManager {
    executions: RwLock<HashMap<String, ExecutionRecord>>,
}

impl InMemoryRealTimeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every monitored execution
    pub fn execution_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.executions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn execution_status(&self, execution_id: &str) -> Option<ExecutionStatusReport> {
        let executions = self.executions.read();
        let record = executions.get(execution_id)?;
        let count = |status: NodeRunStatus| {
            record
                .node_statuses
                .values()
                .filter(|u| u.status == status)
                .count()
        };

        Some(ExecutionStatusReport {
            execution_id: execution_id.to_string(),
            status: ExecutionSummary {
                workflow_id: record.info.workflow_id.clone(),
                pipeline_id: record.info.pipeline_id.clone(),
                state: record.state,
                total_nodes: record.info.total_nodes,
                completed: count(NodeRunStatus::Completed),
                failed: count(NodeRunStatus::Failed),
                skipped: count(NodeRunStatus::Skipped),
                started_at: record.started_at,
                finished_at: record.finished_at,
            },
        })
    }

    pub fn execution_metrics(&self, execution_id: &str) -> Option<NodeStatusReport> {
        self.executions
            .read()
            .get(execution_id)
            .map(|record| NodeStatusReport {
                execution_id: execution_id.to_string(),
                node_statuses: record.node_statuses.clone(),
            })
    }

    /// Every status change of an execution, in arrival order
    pub fn history(&self, execution_id: &str) -> Vec<RecordedUpdate> {
        self.executions
            .read()
            .get(execution_id)
            .map(|record| record.history.clone())
            .unwrap_or_default()
    }
}

impl RealTimeManager for InMemoryRealTimeManager {
    fn start_monitoring(&self, execution_id: &str, info: &MonitoringInfo) -> Result<(), MonitorError> {
        self.executions.write().insert(
            execution_id.to_string(),
            ExecutionRecord {
                info: info.clone(),
                state: OrchestrationStatus::Executing,
                started_at: Utc::now(),
                finished_at: None,
                node_statuses: BTreeMap::new(),
                history: Vec::new(),
            },
        );
        Ok(())
    }

    fn update_execution_status(
        &self,
        execution_id: &str,
        node_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), MonitorError> {
        let mut executions = self.executions.write();
        let record = executions
            .get_mut(execution_id)
            .ok_or_else(|| MonitorError::UnknownExecution(execution_id.to_string()))?;

        record
            .node_statuses
            .insert(node_id.to_string(), update.clone());
        record.history.push(RecordedUpdate {
            node_id: node_id.to_string(),
            update: update.clone(),
        });
        Ok(())
    }

    fn finish_monitoring(
        &self,
        execution_id: &str,
        status: OrchestrationStatus,
    ) -> Result<(), MonitorError> {
        let mut executions = self.executions.write();
        let record = executions
            .get_mut(execution_id)
            .ok_or_else(|| MonitorError::UnknownExecution(execution_id.to_string()))?;
        record.state = status;
        record.finished_at = Some(Utc::now());
        Ok(())
    }
}
