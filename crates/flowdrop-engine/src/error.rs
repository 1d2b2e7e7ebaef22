//! Error types for the workflow engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the workflow engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workflow graph could not be compiled into an execution plan
    #[error("Compilation failed: {0}")]
    Compilation(#[from] CompilationError),

    /// No processor is registered for a node type
    #[error("No processor registered for node type '{node_type}' (node '{node_id}')")]
    UnknownNodeType { node_id: String, node_type: String },

    /// Missing required input
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// Invalid node configuration
    #[error("Invalid configuration for node '{node_id}': {message}")]
    InvalidConfig { node_id: String, message: String },

    /// A processor failed while running
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// Execution context could not be updated
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            node_id: node_id.into(),
            message: message.into(),
        }
    }
}

/// Structural errors found while compiling a workflow
///
/// Any of these aborts the run before a single node executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    /// The dependency graph contains at least one cycle
    #[error("Cycle detected in workflow; unresolved nodes: {}", nodes.join(", "))]
    CycleDetected { nodes: Vec<String> },

    /// An edge references a node id that is not declared
    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownNode { edge_id: String, node_id: String },

    /// Two nodes share the same id
    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),

    /// A node was declared without a type
    #[error("Node '{0}' has no type")]
    MissingNodeType(String),
}

/// Errors raised while updating an execution context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// Recorded outputs are write-once per node
    #[error("Output for node '{0}' is already recorded")]
    OutputAlreadyRecorded(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_lists_nodes() {
        let err = CompilationError::CycleDetected {
            nodes: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Cycle detected in workflow; unresolved nodes: a, b");
    }

    #[test]
    fn test_compilation_error_converts() {
        let err: EngineError = CompilationError::DuplicateNode("n1".to_string()).into();
        assert!(matches!(err, EngineError::Compilation(_)));
        assert!(err.to_string().contains("n1"));
    }
}
