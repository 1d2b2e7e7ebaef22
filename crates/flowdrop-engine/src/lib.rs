//! FlowDrop Engine - synchronous workflow orchestration
//!
//! This crate turns FlowDrop workflow definitions (nodes plus edges or
//! legacy connections) into an execution plan and runs it node by node.
//! It provides:
//!
//! - A compiler producing a deterministic topological order
//! - A processor registry and node runtime service
//! - A write-once execution context shared by a run
//! - Gateway-driven skipping through trigger edges and control signals
//! - Real-time status reporting through pluggable managers
//!
//! # Architecture
//!
//! - `WorkflowCompiler`: validates structure and builds the `ExecutionPlan`
//! - `NodeRuntimeService`: resolves processors and wraps their results
//! - `SynchronousOrchestrator`: walks the plan, one awaited node at a time
//! - `RealTimeManager`: fire-and-forget sink for run and node status
//!
//! # Example
//!
//! ```ignore
//! use flowdrop_engine::{OrchestrationRequest, Orchestrator, SynchronousOrchestrator};
//!
//! let orchestrator = SynchronousOrchestrator::new(Arc::new(registry));
//! let response = orchestrator.orchestrate(OrchestrationRequest::new(workflow)).await?;
//! ```

pub mod builder;
pub mod compiler;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod orchestration;
pub mod processor;
pub mod realtime;
pub mod registry;
pub mod runtime;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use compiler::{CompiledWorkflow, ExecutionPlan, InputMapping, WorkflowCompiler};
pub use config::{MissingDependencyPolicy, OrchestratorConfig};
pub use context::{ExecutionContextService, NodeExecutionContext};
pub use descriptor::{
    NodeCategory, PortDataType, PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
pub use error::{CompilationError, ContextError, EngineError, Result};
pub use orchestration::{
    OrchestrationMetadata, OrchestrationOptions, OrchestrationRequest, OrchestrationResponse,
    OrchestrationStatus, Orchestrator, OrchestratorType, SynchronousOrchestrator,
};
pub use processor::{ControlSignal, NodeConfig, NodeInput, NodeOutput, NodeProcessor};
pub use realtime::{
    InMemoryRealTimeManager, LoggingRealTimeManager, MonitorError, NullRealTimeManager,
    RealTimeManager, StatusUpdate,
};
pub use registry::ProcessorRegistry;
pub use runtime::{NodeExecutionResult, NodeRuntimeService, NodeStatus};
pub use types::{Workflow, WorkflowEdge, WorkflowNode};
pub use validation::{validate_workflow, ValidationError};
