//! Sequential orchestrator
//!
//! Nodes run strictly one after another in compiled order. Each processor
//! is awaited to completion before the next node is considered; nothing is
//! spawned.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use uuid::Uuid;

use super::gateway::{evaluate_triggers, TriggerDecision};
use super::inputs::{resolve_inputs, InputResolution};
use super::types::{
    OrchestrationMetadata, OrchestrationRequest, OrchestrationResponse, OrchestrationStatus,
};
use super::{Orchestrator, OrchestratorType};
use crate::compiler::{CompiledWorkflow, WorkflowCompiler};
use crate::config::{MissingDependencyPolicy, OrchestratorConfig};
use crate::context::{ExecutionContextService, NodeExecutionContext};
use crate::error::Result;
use crate::processor::NodeConfig;
use crate::realtime::{MonitoringInfo, NullRealTimeManager, RealTimeManager, StatusUpdate};
use crate::registry::ProcessorRegistry;
use crate::runtime::{elapsed_ms, error_of, NodeExecutionResult, NodeRuntimeService};
use crate::types::NodeId;

/// Orchestrator that executes one node at a time
pub struct SynchronousOrchestrator {
    compiler: WorkflowCompiler,
    runtime: NodeRuntimeService,
    contexts: ExecutionContextService,
    monitor: Arc<dyn RealTimeManager>,
    config: OrchestratorConfig,
}

/// Book-keeping for one run
#[derive(Default)]
struct RunLedger {
    results: Vec<NodeExecutionResult>,
    skipped: Vec<NodeId>,
    /// Nodes skipped by an inactive branch; their dependents see no input
    branch_skipped: HashSet<NodeId>,
    failed: Vec<NodeId>,
    abort: Option<String>,
}

impl RunLedger {
    fn skip_branch(&mut self, node_id: &str) {
        self.skipped.push(node_id.to_string());
        self.branch_skipped.insert(node_id.to_string());
    }

    /// Skipped for a missing dependency; dependents stay missing too
    fn skip_dependent(&mut self, node_id: &str) {
        self.skipped.push(node_id.to_string());
    }

    fn metadata(&self, total_nodes: usize) -> OrchestrationMetadata {
        OrchestrationMetadata {
            orchestrator_type: OrchestratorType::Synchronous.as_str().to_string(),
            total_nodes,
            nodes_executed: self.results.len(),
            nodes_skipped: self.skipped.len(),
            skipped_node_ids: self.skipped.clone(),
            nodes_failed: self.failed.len(),
            failed_node_ids: self.failed.clone(),
            error: self.abort.clone(),
        }
    }
}

impl SynchronousOrchestrator {
    /// Create an orchestrator with default config and no monitoring
    pub fn new(registry: Arc<ProcessorRegistry>) -> Self {
        Self {
            compiler: WorkflowCompiler::new(),
            runtime: NodeRuntimeService::new(registry),
            contexts: ExecutionContextService::new(),
            monitor: Arc::new(NullRealTimeManager),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_real_time_manager(mut self, monitor: Arc<dyn RealTimeManager>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn runtime(&self) -> &NodeRuntimeService {
        &self.runtime
    }

    async fn execute_plan(
        &self,
        execution_id: &str,
        request: &OrchestrationRequest,
        compiled: &CompiledWorkflow,
        settings: &OrchestratorConfig,
        mut context: NodeExecutionContext,
        ledger: &mut RunLedger,
    ) -> Result<()> {
        let plan = &compiled.execution_plan;

        for node_id in &plan.execution_order {
            let Some(mapping) = compiled.node_mapping(node_id) else {
                continue;
            };
            let node_type = mapping.processor_id.as_str();
            let inputs = plan.inputs_of(node_id);

            if let TriggerDecision::Inactive { reason } = evaluate_triggers(inputs, &context) {
                log::debug!("[{}] skipping '{}': {}", execution_id, node_id, reason);
                ledger.skip_branch(node_id);
                self.notify(execution_id, node_id, &StatusUpdate::skipped(node_type, reason));
                continue;
            }

            let input = match resolve_inputs(inputs, &context, &ledger.branch_skipped) {
                InputResolution::Ready(input) => input,
                InputResolution::MissingDependency { source_node, .. } => {
                    let message = format!(
                        "Missing dependency: node '{}' did not complete successfully",
                        source_node
                    );
                    match settings.missing_dependency_policy {
                        MissingDependencyPolicy::Skip => {
                            log::debug!("[{}] skipping '{}': {}", execution_id, node_id, message);
                            ledger.skip_dependent(node_id);
                            self.notify(
                                execution_id,
                                node_id,
                                &StatusUpdate::skipped(node_type, message),
                            );
                            continue;
                        }
                        MissingDependencyPolicy::Fail => {
                            let result = NodeExecutionResult::failed(
                                node_id.as_str(),
                                node_type,
                                message,
                                0,
                                &context,
                            );
                            if self.record_failure(execution_id, settings, result, ledger) {
                                return Ok(());
                            }
                            continue;
                        }
                    }
                }
            };

            self.notify(execution_id, node_id, &StatusUpdate::running(node_type));

            let started = Instant::now();
            let result = match self
                .runtime
                .execute_node(
                    &request.workflow_id,
                    node_id,
                    node_type,
                    input,
                    NodeConfig::from_value(&mapping.config),
                    &context,
                )
                .await
            {
                Ok(result) => result,
                Err(e) => NodeExecutionResult::failed(
                    node_id.as_str(),
                    node_type,
                    e.to_string(),
                    elapsed_ms(started),
                    &context,
                ),
            };

            if result.is_success() {
                context = self
                    .contexts
                    .update_context(context, node_id, result.output.clone())?;
                self.notify(
                    execution_id,
                    node_id,
                    &StatusUpdate::completed(node_type, result.execution_time_ms),
                );
                ledger.results.push(result);
            } else if self.record_failure(execution_id, settings, result, ledger) {
                return Ok(());
            }
        }

        Ok(())
    }

    /// Record a failed node; returns `true` when the run must stop
    fn record_failure(
        &self,
        execution_id: &str,
        settings: &OrchestratorConfig,
        result: NodeExecutionResult,
        ledger: &mut RunLedger,
    ) -> bool {
        let error = error_of(&result).unwrap_or("unknown error").to_string();
        log::warn!("[{}] node '{}' failed: {}", execution_id, result.node_id, error);
        self.notify(
            execution_id,
            &result.node_id,
            &StatusUpdate::failed(&result.node_type, error.clone()),
        );

        ledger.failed.push(result.node_id.clone());
        let node_id = result.node_id.clone();
        ledger.results.push(result);

        if settings.continue_on_error {
            false
        } else {
            ledger.abort = Some(format!("Node '{}' failed: {}", node_id, error));
            true
        }
    }

    fn notify(&self, execution_id: &str, node_id: &str, update: &StatusUpdate) {
        if let Err(e) = self
            .monitor
            .update_execution_status(execution_id, node_id, update)
        {
            log::warn!("[{}] status update for '{}' dropped: {}", execution_id, node_id, e);
        }
    }

    fn start_monitoring(&self, execution_id: &str, info: &MonitoringInfo) {
        if let Err(e) = self.monitor.start_monitoring(execution_id, info) {
            log::warn!("[{}] failed to start monitoring: {}", execution_id, e);
        }
    }

    fn finish_monitoring(&self, execution_id: &str, status: OrchestrationStatus) {
        if let Err(e) = self.monitor.finish_monitoring(execution_id, status) {
            log::warn!("[{}] failed to finish monitoring: {}", execution_id, e);
        }
    }
}

fn advance(execution_id: &str, status: &mut OrchestrationStatus, next: OrchestrationStatus) {
    log::debug!("[{}] {:?} -> {:?}", execution_id, status, next);
    *status = next;
}

#[async_trait]
impl Orchestrator for SynchronousOrchestrator {
    fn orchestrator_type(&self) -> OrchestratorType {
        OrchestratorType::Synchronous
    }

    async fn orchestrate(&self, request: OrchestrationRequest) -> Result<OrchestrationResponse> {
        let started = Instant::now();
        let execution_id = Uuid::new_v4().to_string();
        let settings = request.options.resolve(&self.config);
        let mut status = OrchestrationStatus::Pending;

        log::info!(
            "[{}] starting workflow '{}' ({} nodes)",
            execution_id,
            request.workflow_id,
            request.workflow.nodes.len()
        );

        advance(&execution_id, &mut status, OrchestrationStatus::Compiling);
        let compiled = match self.compiler.compile(&request.workflow) {
            Ok(compiled) => compiled,
            Err(e) => {
                log::warn!("[{}] compilation failed: {}", execution_id, e);
                advance(&execution_id, &mut status, OrchestrationStatus::Failed);

                let total_nodes = request.workflow.nodes.len();
                self.start_monitoring(
                    &execution_id,
                    &MonitoringInfo {
                        workflow_id: request.workflow_id.clone(),
                        pipeline_id: request.pipeline_id.clone(),
                        orchestrator_type: OrchestratorType::Synchronous.to_string(),
                        total_nodes,
                    },
                );
                self.finish_monitoring(&execution_id, status);

                let ledger = RunLedger {
                    abort: Some(e.to_string()),
                    ..Default::default()
                };
                return Ok(OrchestrationResponse {
                    execution_id,
                    status,
                    results: Vec::new(),
                    execution_time_ms: elapsed_ms(started),
                    metadata: ledger.metadata(total_nodes),
                });
            }
        };

        let total_nodes = compiled.node_count();
        let context = self.contexts.create_context(
            request.workflow_id.clone(),
            request.pipeline_id.clone(),
            request.initial_data.clone(),
        );

        self.start_monitoring(
            &execution_id,
            &MonitoringInfo {
                workflow_id: request.workflow_id.clone(),
                pipeline_id: request.pipeline_id.clone(),
                orchestrator_type: OrchestratorType::Synchronous.to_string(),
                total_nodes,
            },
        );

        advance(&execution_id, &mut status, OrchestrationStatus::Executing);
        let mut ledger = RunLedger::default();
        let outcome = self
            .execute_plan(&execution_id, &request, &compiled, &settings, context, &mut ledger)
            .await;

        if let Err(e) = outcome {
            ledger.abort = Some(e.to_string());
        }
        let next = if ledger.abort.is_some() {
            OrchestrationStatus::Failed
        } else {
            OrchestrationStatus::Completed
        };
        advance(&execution_id, &mut status, next);
        self.finish_monitoring(&execution_id, status);

        let metadata = ledger.metadata(total_nodes);
        log::info!(
            "[{}] workflow '{}' {:?}: {} executed, {} skipped, {} failed",
            execution_id,
            request.workflow_id,
            status,
            metadata.nodes_executed,
            metadata.nodes_skipped,
            metadata.nodes_failed
        );

        Ok(OrchestrationResponse {
            execution_id,
            status,
            results: ledger.results,
            execution_time_ms: elapsed_ms(started),
            metadata,
        })
    }
}
