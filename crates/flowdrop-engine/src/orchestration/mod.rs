//! Orchestration of compiled workflows
//!
//! An orchestrator compiles a workflow, walks its execution order and
//! decides per node whether to skip it (inactive trigger edges), fail it
//! (missing dependency) or run it through the node runtime.
//!
//! # Example
//!
//! ```ignore
//! use flowdrop_engine::orchestration::{Orchestrator, OrchestrationRequest, SynchronousOrchestrator};
//!
//! let orchestrator = SynchronousOrchestrator::new(Arc::new(registry));
//! let response = orchestrator
//!     .orchestrate(OrchestrationRequest::new(workflow).with_initial_data(data))
//!     .await?;
//! println!("{} nodes executed", response.metadata.nodes_executed);
//! ```

pub mod gateway;
pub mod inputs;
pub mod synchronous;
pub mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use gateway::{evaluate_triggers, is_trigger_active, TriggerDecision};
pub use inputs::{resolve_inputs, InputResolution};
pub use synchronous::SynchronousOrchestrator;
pub use types::{
    OrchestrationMetadata, OrchestrationOptions, OrchestrationRequest, OrchestrationResponse,
    OrchestrationStatus,
};

/// Execution strategy of an orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorType {
    /// Nodes run one at a time in compiled order
    Synchronous,
}

impl OrchestratorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synchronous => "synchronous",
        }
    }
}

impl std::fmt::Display for OrchestratorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs workflows end to end
#[async_trait]
pub trait Orchestrator: Send + Sync {
    fn orchestrator_type(&self) -> OrchestratorType;

    /// Execute one run.
    ///
    /// Compilation failures and node failures are reported through the
    /// response status and metadata, not as `Err`.
    async fn orchestrate(&self, request: OrchestrationRequest) -> Result<OrchestrationResponse>;
}
