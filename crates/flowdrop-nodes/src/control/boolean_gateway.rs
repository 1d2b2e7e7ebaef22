//! Boolean Gateway Processor

use async_trait::async_trait;
use flowdrop_engine::processor::is_truthy;
use flowdrop_engine::{
    ControlSignal, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::Value;

use crate::fields::lookup;

/// Routes to the `true` or `false` branch by the truthiness of `value`
///
/// A missing value is falsy.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanGatewayProcessor;

impl BooleanGatewayProcessor {
    pub const NODE_TYPE: &'static str = "boolean_gateway";
    pub const PORT_VALUE: &'static str = "value";
}

impl ProcessorDescriptor for BooleanGatewayProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Control,
            label: "Boolean Gateway".to_string(),
            description: "Routes execution by a true/false value".to_string(),
            inputs: vec![PortMetadata::optional(
                Self::PORT_VALUE,
                "Value",
                PortDataType::Any,
            )],
            outputs: vec![
                PortMetadata::optional("true", "True", PortDataType::Trigger),
                PortMetadata::optional("false", "False", PortDataType::Trigger),
                PortMetadata::optional("result", "Result", PortDataType::Boolean),
            ],
            config: Vec::new(),
        }
    }
}

#[async_trait]
impl NodeProcessor for BooleanGatewayProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, _config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let value = lookup(inputs, Self::PORT_VALUE).cloned().unwrap_or(Value::Null);
        let result = is_truthy(&value);
        log::debug!("BooleanGatewayProcessor: {} -> {}", value, result);

        Ok(NodeOutput::empty()
            .with_value("result", result)
            .with_value(Self::PORT_VALUE, value)
            .with_control(ControlSignal::boolean(result)))
    }
}
