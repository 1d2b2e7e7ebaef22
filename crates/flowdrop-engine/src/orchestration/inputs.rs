//! Input resolution from recorded outputs

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::compiler::InputMapping;
use crate::context::NodeExecutionContext;
use crate::processor::NodeInput;
use crate::types::DEFAULT_PORT;

/// Result of gathering a node's data inputs
#[derive(Debug, Clone, PartialEq)]
pub enum InputResolution {
    Ready(NodeInput),
    /// A data source ran and failed, so this node cannot get its input
    MissingDependency { source_node: String, edge_id: String },
}

/// Build the input of a node from its data mappings
///
/// Nodes without data mappings receive the initial data. Sources that were
/// skipped by a gateway contribute nothing. Several mappings into the same
/// input port are collected into an array in edge order.
pub fn resolve_inputs(
    mappings: &[InputMapping],
    context: &NodeExecutionContext,
    skipped: &HashSet<String>,
) -> InputResolution {
    let mut data = mappings.iter().filter(|m| !m.is_trigger()).peekable();
    if data.peek().is_none() {
        return InputResolution::Ready(NodeInput::new(context.initial_data().clone()));
    }

    let mut values: Map<String, Value> = Map::new();
    let mut merged: HashSet<String> = HashSet::new();

    for mapping in data {
        let Some(output) = context.node_output(&mapping.source_node) else {
            if skipped.contains(&mapping.source_node) {
                log::debug!(
                    "Input '{}' from skipped node '{}' left empty",
                    mapping.target_input,
                    mapping.source_node
                );
                continue;
            }
            return InputResolution::MissingDependency {
                source_node: mapping.source_node.clone(),
                edge_id: mapping.edge_id.clone(),
            };
        };

        let value = match mapping.source_output.as_deref() {
            _ if mapping.target_input == DEFAULT_PORT => output.to_value(),
            Some(port) => output.get(port).cloned().unwrap_or_else(|| output.to_value()),
            None => output.to_value(),
        };

        match values.remove(&mapping.target_input) {
            None => {
                values.insert(mapping.target_input.clone(), value);
            }
            Some(existing) => {
                let combined = if merged.contains(&mapping.target_input) {
                    match existing {
                        Value::Array(mut items) => {
                            items.push(value);
                            Value::Array(items)
                        }
                        other => Value::Array(vec![other, value]),
                    }
                } else {
                    merged.insert(mapping.target_input.clone());
                    Value::Array(vec![existing, value])
                };
                values.insert(mapping.target_input.clone(), combined);
            }
        }
    }

    InputResolution::Ready(NodeInput::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MappingType;
    use crate::context::ExecutionContextService;
    use crate::processor::NodeOutput;
    use serde_json::json;

    fn mapping(source: &str, port: Option<&str>, target: &str) -> InputMapping {
        InputMapping {
            mapping_type: MappingType::Output,
            source_node: source.to_string(),
            source_output: port.map(str::to_string),
            target_input: target.to_string(),
            edge_id: format!("{}->{}", source, target),
        }
    }

    fn context() -> NodeExecutionContext {
        let service = ExecutionContextService::new();
        let mut initial = Map::new();
        initial.insert("text".to_string(), json!("start"));
        let context = service.create_context("wf", "pipe", initial);
        let context = service
            .update_context(
                context,
                "a",
                NodeOutput::empty().with_value("text", "hello").with_value("length", 5),
            )
            .unwrap();
        service
            .update_context(context, "b", NodeOutput::empty().with_value("text", "world"))
            .unwrap()
    }

    fn ready(resolution: InputResolution) -> NodeInput {
        match resolution {
            InputResolution::Ready(input) => input,
            other => panic!("expected ready input, got {:?}", other),
        }
    }

    #[test]
    fn test_named_port_selects_field() {
        let input = ready(resolve_inputs(
            &[mapping("a", Some("text"), "text")],
            &context(),
            &HashSet::new(),
        ));
        assert_eq!(input.get("text"), Some(&json!("hello")));
    }

    #[test]
    fn test_unknown_port_falls_back_to_whole_output() {
        let input = ready(resolve_inputs(
            &[mapping("a", Some("missing"), "value")],
            &context(),
            &HashSet::new(),
        ));
        assert_eq!(input.get("value"), Some(&json!({"text": "hello", "length": 5})));
    }

    #[test]
    fn test_default_port_receives_whole_output() {
        let input = ready(resolve_inputs(
            &[mapping("a", None, "default")],
            &context(),
            &HashSet::new(),
        ));
        assert_eq!(input.get("default"), Some(&json!({"text": "hello", "length": 5})));
    }

    #[test]
    fn test_no_data_mappings_uses_initial_data() {
        let input = ready(resolve_inputs(&[], &context(), &HashSet::new()));
        assert_eq!(input.get("text"), Some(&json!("start")));
    }

    #[test]
    fn test_fan_in_collects_array() {
        let input = ready(resolve_inputs(
            &[
                mapping("a", Some("text"), "texts"),
                mapping("b", Some("text"), "texts"),
                mapping("a", Some("length"), "texts"),
            ],
            &context(),
            &HashSet::new(),
        ));
        assert_eq!(input.get("texts"), Some(&json!(["hello", "world", 5])));
    }

    #[test]
    fn test_skipped_source_contributes_nothing() {
        let skipped: HashSet<String> = ["gone".to_string()].into_iter().collect();
        let input = ready(resolve_inputs(
            &[
                mapping("gone", Some("text"), "text"),
                mapping("b", Some("text"), "other"),
            ],
            &context(),
            &skipped,
        ));
        assert!(input.get("text").is_none());
        assert_eq!(input.get("other"), Some(&json!("world")));
    }

    #[test]
    fn test_failed_source_is_missing_dependency() {
        let resolution = resolve_inputs(
            &[mapping("broken", Some("text"), "text")],
            &context(),
            &HashSet::new(),
        );
        assert_eq!(
            resolution,
            InputResolution::MissingDependency {
                source_node: "broken".to_string(),
                edge_id: "broken->text".to_string(),
            }
        );
    }
}
