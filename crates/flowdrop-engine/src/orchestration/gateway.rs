//! Trigger edge evaluation
//!
//! A node with incoming trigger edges only runs when at least one of them
//! is active. An edge is active when its source completed successfully and
//! either emitted no control signal or selected the edge's branch.

use crate::compiler::InputMapping;
use crate::context::NodeExecutionContext;

/// Whether a node may run, judged from its trigger edges alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// No incoming trigger edges
    Ungated,
    /// At least one trigger edge is active
    Active { edge_id: String },
    /// Every trigger edge is inactive
    Inactive { reason: String },
}

impl TriggerDecision {
    pub fn should_skip(&self) -> bool {
        matches!(self, Self::Inactive { .. })
    }
}

/// Check a single trigger mapping against the recorded outputs
pub fn is_trigger_active(mapping: &InputMapping, context: &NodeExecutionContext) -> bool {
    // Only successful nodes have recorded outputs
    let Some(output) = context.node_output(&mapping.source_node) else {
        return false;
    };

    match &output.control {
        None => true,
        Some(signal) => mapping
            .source_output
            .as_deref()
            .is_some_and(|branch| signal.activates(branch)),
    }
}

/// Evaluate every trigger mapping of a node
pub fn evaluate_triggers(
    mappings: &[InputMapping],
    context: &NodeExecutionContext,
) -> TriggerDecision {
    let mut triggers = mappings.iter().filter(|m| m.is_trigger()).peekable();
    if triggers.peek().is_none() {
        return TriggerDecision::Ungated;
    }

    let mut inactive = Vec::new();
    for mapping in triggers {
        if is_trigger_active(mapping, context) {
            return TriggerDecision::Active {
                edge_id: mapping.edge_id.clone(),
            };
        }
        inactive.push(format!(
            "{}:{}",
            mapping.source_node,
            mapping.source_output.as_deref().unwrap_or("")
        ));
    }

    TriggerDecision::Inactive {
        reason: format!("no active trigger ({})", inactive.join(", ")),
    }
}
