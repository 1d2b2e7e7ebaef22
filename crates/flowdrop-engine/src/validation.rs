//! Workflow validation
//!
//! Reports every structural problem in a workflow at once, plus registry
//! problems when a registry is supplied. The orchestrator does not call
//! this; it relies on the compiler, which stops at the first error.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::registry::ProcessorRegistry;
use crate::types::{ResolvedEdge, Workflow, DEFAULT_PORT};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Cycle detected in the graph
    CycleDetected { nodes: Vec<String> },
    /// Two nodes share an id
    DuplicateNodeId { node_id: String },
    /// A node has no type
    MissingNodeType { node_id: String },
    /// A node has an unknown type (not in registry)
    UnknownNodeType { node_id: String, node_type: String },
    /// A required input port is neither connected nor configured
    UnconnectedRequiredInput { node_id: String, port_id: String },
    /// An edge references a non-existent node
    UnknownNode { edge_id: String, node_id: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { nodes } => {
                write!(f, "Cycle detected between nodes: {}", nodes.join(", "))
            }
            Self::DuplicateNodeId { node_id } => write!(f, "Duplicate node id '{}'", node_id),
            Self::MissingNodeType { node_id } => write!(f, "Node '{}' has no type", node_id),
            Self::UnknownNodeType { node_id, node_type } => {
                write!(f, "Unknown node type '{}' for node '{}'", node_type, node_id)
            }
            Self::UnconnectedRequiredInput { node_id, port_id } => {
                write!(
                    f,
                    "Required input '{}' on node '{}' is not connected",
                    port_id, node_id
                )
            }
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a workflow
///
/// Returns all validation errors found (not just the first).
/// Pass a registry to enable node type and required input checks.
pub fn validate_workflow(
    workflow: &Workflow,
    registry: Option<&ProcessorRegistry>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let edges = workflow.resolved_edges();

    validate_nodes(workflow, &mut errors);
    validate_edge_references(workflow, &edges, &mut errors);
    detect_cycles(workflow, &edges, &mut errors);

    if let Some(reg) = registry {
        validate_node_types(workflow, reg, &mut errors);
        validate_required_inputs(workflow, &edges, reg, &mut errors);
    }

    errors
}

fn validate_nodes(workflow: &Workflow, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
        if node.node_type.trim().is_empty() {
            errors.push(ValidationError::MissingNodeType {
                node_id: node.id.clone(),
            });
        }
    }
}

/// Check that all edge source/target nodes exist
fn validate_edge_references(
    workflow: &Workflow,
    edges: &[ResolvedEdge],
    errors: &mut Vec<ValidationError>,
) {
    let node_ids: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                errors.push(ValidationError::UnknownNode {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }
}

/// Detect cycles using Kahn's algorithm, reporting the nodes left over
fn detect_cycles(workflow: &Workflow, edges: &[ResolvedEdge], errors: &mut Vec<ValidationError>) {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in &workflow.nodes {
        in_degree.insert(&node.id, 0);
    }

    let mut unique: HashSet<(&str, &str)> = HashSet::new();
    for edge in edges {
        if in_degree.contains_key(edge.source.as_str())
            && in_degree.contains_key(edge.target.as_str())
            && unique.insert((edge.source.as_str(), edge.target.as_str()))
        {
            *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(node_id) = queue.pop_front() {
        for &(source, target) in &unique {
            if source == node_id {
                if let Some(deg) = in_degree.get_mut(target) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(target);
                    }
                }
            }
        }
    }

    let remaining: Vec<String> = workflow
        .nodes
        .iter()
        .filter(|n| in_degree.get(n.id.as_str()).is_some_and(|&deg| deg > 0))
        .map(|n| n.id.clone())
        .collect();

    if !remaining.is_empty() {
        errors.push(ValidationError::CycleDetected { nodes: remaining });
    }
}

/// Check that all nodes have known types in the registry
fn validate_node_types(
    workflow: &Workflow,
    registry: &ProcessorRegistry,
    errors: &mut Vec<ValidationError>,
) {
    for node in &workflow.nodes {
        if !node.node_type.is_empty() && !registry.has_node_type(&node.node_type) {
            errors.push(ValidationError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            });
        }
    }
}

/// Check that required inputs are connected or configured
///
/// Nodes without incoming data edges receive the run's initial data, and
/// an edge into the `default` port delivers a whole output; neither is
/// checked port by port.
fn validate_required_inputs(
    workflow: &Workflow,
    edges: &[ResolvedEdge],
    registry: &ProcessorRegistry,
    errors: &mut Vec<ValidationError>,
) {
    let mut connected: HashSet<(&str, &str)> = HashSet::new();
    let mut has_data_edges: HashSet<&str> = HashSet::new();
    for edge in edges.iter().filter(|e| !e.is_trigger()) {
        has_data_edges.insert(edge.target.as_str());
        connected.insert((
            edge.target.as_str(),
            edge.target_port.as_deref().unwrap_or(DEFAULT_PORT),
        ));
    }

    for node in &workflow.nodes {
        if !has_data_edges.contains(node.id.as_str())
            || connected.contains(&(node.id.as_str(), DEFAULT_PORT))
        {
            continue;
        }
        let Some(metadata) = registry.get_metadata(&node.node_type) else {
            continue;
        };

        for port in metadata.inputs.iter().filter(|p| p.required) {
            let configured = node.config.get(&port.id).is_some_and(|v| !v.is_null());
            if !configured && !connected.contains(&(node.id.as_str(), port.id.as_str())) {
                errors.push(ValidationError::UnconnectedRequiredInput {
                    node_id: node.id.clone(),
                    port_id: port.id.clone(),
                });
            }
        }
    }
}
