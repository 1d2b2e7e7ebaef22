//! Workflow compiler
//!
//! Turns a raw [`Workflow`] into a [`CompiledWorkflow`]: a topological
//! execution order plus per-node input/output mappings. Compilation either
//! succeeds completely or fails with a [`CompilationError`]; no partial plan
//! is ever produced.
//!
//! Ordering uses Kahn's algorithm. Among nodes whose dependencies are all
//! placed, the one declared first in `nodes` goes next, so compiling the same
//! definition twice always yields the same order.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CompilationError;
use crate::types::{EdgeKind, NodeId, PortId, ResolvedEdge, Workflow, DEFAULT_PORT};

/// How an input mapping is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    /// The source node's output feeds an input port
    Output,
    /// The source node gates execution through a branch
    Trigger,
}

/// One incoming edge of a node, as seen by input resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMapping {
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    pub source_node: NodeId,
    /// Output port (or branch) on the source; `None` for legacy connections
    pub source_output: Option<PortId>,
    pub target_input: PortId,
    pub edge_id: String,
}

impl InputMapping {
    pub fn is_trigger(&self) -> bool {
        self.mapping_type == MappingType::Trigger
    }
}

/// One outgoing edge of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputMapping {
    pub target_node: NodeId,
    pub source_output: Option<PortId>,
    pub target_input: PortId,
    pub edge_type: EdgeKind,
    pub edge_id: String,
}

/// Summary numbers about a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub trigger_edge_count: usize,
    /// Nodes without dependencies, in declaration order
    pub root_nodes: Vec<NodeId>,
    /// Nodes without dependents, in declaration order
    pub leaf_nodes: Vec<NodeId>,
}

/// Execution order plus data routing for a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub execution_order: Vec<NodeId>,
    pub input_mappings: BTreeMap<NodeId, Vec<InputMapping>>,
    pub output_mappings: BTreeMap<NodeId, Vec<OutputMapping>>,
    pub metadata: PlanMetadata,
}

impl ExecutionPlan {
    /// All incoming mappings of a node, in edge declaration order
    pub fn inputs_of(&self, node_id: &str) -> &[InputMapping] {
        self.input_mappings
            .get(node_id)
            .map(|m| m.as_slice())
            .unwrap_or(&[])
    }

    /// Incoming mappings of `node_id` that originate at `source_node`
    pub fn inputs_from<'a>(
        &'a self,
        node_id: &str,
        source_node: &'a str,
    ) -> impl Iterator<Item = &'a InputMapping> + 'a {
        self.inputs_of(node_id)
            .iter()
            .filter(move |m| m.source_node == source_node)
    }

    /// Outgoing mappings of a node
    pub fn outputs_of(&self, node_id: &str) -> &[OutputMapping] {
        self.output_mappings
            .get(node_id)
            .map(|m| m.as_slice())
            .unwrap_or(&[])
    }

    /// Position of a node in the execution order
    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.execution_order.iter().position(|id| id == node_id)
    }
}

/// Static per-node descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMapping {
    pub node_id: NodeId,
    pub processor_id: String,
    pub config: serde_json::Value,
    pub metadata: NodeMappingMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMappingMetadata {
    pub label: Option<String>,
    /// Index of the node in the workflow's `nodes` array
    pub declaration_index: usize,
    /// Whether any incoming edge is a trigger edge
    pub has_trigger_inputs: bool,
}

/// Dependencies between nodes (duplicates collapsed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// node -> nodes it depends on
    dependencies: BTreeMap<NodeId, Vec<NodeId>>,
    /// node -> nodes depending on it
    dependents: BTreeMap<NodeId, Vec<NodeId>>,
}

impl DependencyGraph {
    fn build(workflow: &Workflow, edges: &[ResolvedEdge]) -> Self {
        let mut graph = Self::default();
        for node in &workflow.nodes {
            graph.dependencies.entry(node.id.clone()).or_default();
            graph.dependents.entry(node.id.clone()).or_default();
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for edge in edges {
            if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
                continue;
            }
            graph
                .dependencies
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
            graph
                .dependents
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
        }
        graph
    }

    /// Nodes `node_id` depends on
    pub fn dependencies_of(&self, node_id: &str) -> &[NodeId] {
        self.dependencies
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes depending on `node_id`
    pub fn dependents_of(&self, node_id: &str) -> &[NodeId] {
        self.dependents
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

/// Details about the compilation itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationMetadata {
    pub workflow_name: String,
    pub compiled_at: DateTime<Utc>,
}

/// Output of the compiler; immutable for the rest of the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledWorkflow {
    pub workflow_id: String,
    pub execution_plan: ExecutionPlan,
    pub node_mappings: BTreeMap<NodeId, NodeMapping>,
    pub dependency_graph: DependencyGraph,
    pub metadata: CompilationMetadata,
}

impl CompiledWorkflow {
    pub fn node_mapping(&self, node_id: &str) -> Option<&NodeMapping> {
        self.node_mappings.get(node_id)
    }

    pub fn node_count(&self) -> usize {
        self.execution_plan.execution_order.len()
    }
}

/// Compiles workflow definitions into execution plans
#[derive(Debug, Clone, Default)]
pub struct WorkflowCompiler;

impl WorkflowCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile a workflow snapshot
    pub fn compile(&self, workflow: &Workflow) -> Result<CompiledWorkflow, CompilationError> {
        let declaration = index_nodes(workflow)?;
        let edges = workflow.resolved_edges();

        for edge in &edges {
            for endpoint in [&edge.source, &edge.target] {
                if !declaration.contains_key(endpoint.as_str()) {
                    return Err(CompilationError::UnknownNode {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }

        let dependency_graph = DependencyGraph::build(workflow, &edges);
        let execution_order = topological_order(workflow, &declaration, &dependency_graph)?;

        let mut input_mappings: BTreeMap<NodeId, Vec<InputMapping>> = BTreeMap::new();
        let mut output_mappings: BTreeMap<NodeId, Vec<OutputMapping>> = BTreeMap::new();
        for edge in &edges {
            let target_input = edge
                .target_port
                .clone()
                .unwrap_or_else(|| DEFAULT_PORT.to_string());
            let mapping_type = match edge.kind {
                EdgeKind::Data => MappingType::Output,
                EdgeKind::Trigger => MappingType::Trigger,
            };

            input_mappings
                .entry(edge.target.clone())
                .or_default()
                .push(InputMapping {
                    mapping_type,
                    source_node: edge.source.clone(),
                    source_output: edge.source_port.clone(),
                    target_input: target_input.clone(),
                    edge_id: edge.id.clone(),
                });
            output_mappings
                .entry(edge.source.clone())
                .or_default()
                .push(OutputMapping {
                    target_node: edge.target.clone(),
                    source_output: edge.source_port.clone(),
                    target_input,
                    edge_type: edge.kind,
                    edge_id: edge.id.clone(),
                });
        }

        let node_mappings: BTreeMap<NodeId, NodeMapping> = workflow
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let has_trigger_inputs = input_mappings
                    .get(&node.id)
                    .is_some_and(|m| m.iter().any(InputMapping::is_trigger));
                let mapping = NodeMapping {
                    node_id: node.id.clone(),
                    processor_id: node.node_type.clone(),
                    config: node.config.clone(),
                    metadata: NodeMappingMetadata {
                        label: node.label.clone(),
                        declaration_index: index,
                        has_trigger_inputs,
                    },
                };
                (node.id.clone(), mapping)
            })
            .collect();

        let metadata = PlanMetadata {
            node_count: workflow.nodes.len(),
            edge_count: edges.len(),
            trigger_edge_count: edges.iter().filter(|e| e.is_trigger()).count(),
            root_nodes: workflow
                .nodes
                .iter()
                .filter(|n| dependency_graph.dependencies_of(&n.id).is_empty())
                .map(|n| n.id.clone())
                .collect(),
            leaf_nodes: workflow
                .nodes
                .iter()
                .filter(|n| dependency_graph.dependents_of(&n.id).is_empty())
                .map(|n| n.id.clone())
                .collect(),
        };

        log::debug!(
            "Compiled workflow '{}': {} nodes, {} edges, order {:?}",
            workflow.id,
            metadata.node_count,
            metadata.edge_count,
            execution_order
        );

        Ok(CompiledWorkflow {
            workflow_id: workflow.id.clone(),
            execution_plan: ExecutionPlan {
                execution_order,
                input_mappings,
                output_mappings,
                metadata,
            },
            node_mappings,
            dependency_graph,
            metadata: CompilationMetadata {
                workflow_name: workflow.name.clone(),
                compiled_at: Utc::now(),
            },
        })
    }
}

/// Map node id -> declaration index, rejecting duplicates and untyped nodes
fn index_nodes(workflow: &Workflow) -> Result<HashMap<&str, usize>, CompilationError> {
    let mut declaration = HashMap::with_capacity(workflow.nodes.len());
    for (index, node) in workflow.nodes.iter().enumerate() {
        if node.node_type.trim().is_empty() {
            return Err(CompilationError::MissingNodeType(node.id.clone()));
        }
        if declaration.insert(node.id.as_str(), index).is_some() {
            return Err(CompilationError::DuplicateNode(node.id.clone()));
        }
    }
    Ok(declaration)
}

/// Kahn's algorithm with declaration-order tie-break
fn topological_order(
    workflow: &Workflow,
    declaration: &HashMap<&str, usize>,
    graph: &DependencyGraph,
) -> Result<Vec<NodeId>, CompilationError> {
    let mut in_degree: Vec<usize> = workflow
        .nodes
        .iter()
        .map(|n| graph.dependencies_of(&n.id).len())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &deg)| deg == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(workflow.nodes.len());
    while let Some(Reverse(index)) = ready.pop() {
        let node_id = &workflow.nodes[index].id;
        order.push(node_id.clone());

        for dependent in graph.dependents_of(node_id) {
            if let Some(&dep_index) = declaration.get(dependent.as_str()) {
                in_degree[dep_index] -= 1;
                if in_degree[dep_index] == 0 {
                    ready.push(Reverse(dep_index));
                }
            }
        }
    }

    if order.len() < workflow.nodes.len() {
        let nodes = workflow
            .nodes
            .iter()
            .zip(&in_degree)
            .filter(|(_, &deg)| deg > 0)
            .map(|(n, _)| n.id.clone())
            .collect();
        return Err(CompilationError::CycleDetected { nodes });
    }

    Ok(order)
}
