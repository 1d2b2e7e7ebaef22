//! Conditional Processor

use async_trait::async_trait;
use flowdrop_engine::{
    ControlSignal, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::{json, Value};

use super::compare::Operator;
use crate::fields::{lookup, lookup_or_config};

/// Compares input `value` against `compareValue` and routes `true`/`false`
///
/// `compareValue` may also be wired as an input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionalProcessor;

impl ConditionalProcessor {
    pub const NODE_TYPE: &'static str = "conditional";
    pub const PORT_VALUE: &'static str = "value";
    pub const PORT_COMPARE: &'static str = "compareValue";
}

impl ProcessorDescriptor for ConditionalProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Control,
            label: "Conditional".to_string(),
            description: "Routes execution by comparing a value".to_string(),
            inputs: vec![
                PortMetadata::optional(Self::PORT_VALUE, "Value", PortDataType::Any),
                PortMetadata::optional(Self::PORT_COMPARE, "Compare value", PortDataType::Any),
            ],
            outputs: vec![
                PortMetadata::optional("true", "True", PortDataType::Trigger),
                PortMetadata::optional("false", "False", PortDataType::Trigger),
                PortMetadata::optional("result", "Result", PortDataType::Boolean),
                PortMetadata::optional(Self::PORT_VALUE, "Value", PortDataType::Any),
            ],
            config: vec![
                PortMetadata::optional("operator", "Operator", PortDataType::String)
                    .with_default(json!("=="))
                    .with_options(&["==", "!=", ">", ">=", "<", "<=", "contains", "is_empty", "is_not_empty"]),
                PortMetadata::optional(Self::PORT_COMPARE, "Compare value", PortDataType::Any),
                PortMetadata::optional("caseSensitive", "Case sensitive", PortDataType::Boolean)
                    .with_default(json!(true)),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for ConditionalProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let value = lookup(inputs, Self::PORT_VALUE).cloned().unwrap_or(Value::Null);
        let compare = lookup_or_config(inputs, config, Self::PORT_COMPARE)
            .cloned()
            .unwrap_or(Value::Null);
        let operator: Operator = config.get_str_or("operator", "==").parse()?;

        let result = operator.evaluate(&value, &compare, config.get_bool_or("caseSensitive", true))?;
        log::debug!("ConditionalProcessor: {} {:?} {} -> {}", value, operator, compare, result);

        Ok(NodeOutput::empty()
            .with_value("result", result)
            .with_value(Self::PORT_VALUE, value)
            .with_control(ControlSignal::boolean(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(value: Value, config: Value) -> NodeOutput {
        let inputs: NodeInput = [("value".to_string(), value)].into_iter().collect();
        ConditionalProcessor
            .process(&inputs, &NodeConfig::from_value(&config))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_numeric_threshold() {
        let high = run(json!(75), json!({"operator": ">=", "compareValue": 50})).await;
        assert_eq!(high.get("result"), Some(&json!(true)));
        assert_eq!(high.control, Some(ControlSignal::boolean(true)));

        let low = run(json!("20"), json!({"operator": ">=", "compareValue": 50})).await;
        assert_eq!(low.control, Some(ControlSignal::boolean(false)));
    }

    #[tokio::test]
    async fn test_emptiness_ignores_compare_value() {
        let output = run(json!(""), json!({"operator": "is_empty"})).await;
        assert_eq!(output.get("result"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_compare_value_from_input() {
        let inputs: NodeInput = [
            ("value".to_string(), json!("abc")),
            ("compareValue".to_string(), json!("abc")),
        ]
        .into_iter()
        .collect();
        let output = ConditionalProcessor
            .process(&inputs, &NodeConfig::from_value(&json!({"compareValue": "zzz"})))
            .await
            .unwrap();
        assert_eq!(output.get("result"), Some(&json!(true)));
    }
}
