//! Manual Trigger Processor

use async_trait::async_trait;
use chrono::Utc;
use flowdrop_engine::{
    NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType, PortMetadata,
    ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::{json, Value};

/// Starts a flow on demand
///
/// Emits `triggered: true`, the trigger time, and a `data` object made of
/// the configured `payload` overlaid with whatever reached the node (the
/// initial data for root nodes).
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualTriggerProcessor;

impl ManualTriggerProcessor {
    pub const NODE_TYPE: &'static str = "manual_trigger";
    pub const PORT_DATA: &'static str = "data";
}

impl ProcessorDescriptor for ManualTriggerProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Input,
            label: "Manual Trigger".to_string(),
            description: "Starts the workflow when run manually".to_string(),
            inputs: vec![],
            outputs: vec![
                PortMetadata::optional("triggered", "Triggered", PortDataType::Boolean),
                PortMetadata::optional("timestamp", "Timestamp", PortDataType::String),
                PortMetadata::optional(Self::PORT_DATA, "Data", PortDataType::Json),
            ],
            config: vec![PortMetadata::optional("payload", "Payload", PortDataType::Json)],
        }
    }
}

#[async_trait]
impl NodeProcessor for ManualTriggerProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let mut data = match config.get("payload") {
            Some(Value::Object(payload)) => payload.clone(),
            _ => serde_json::Map::new(),
        };
        for (key, value) in inputs.values() {
            data.insert(key.clone(), value.clone());
        }

        log::debug!("ManualTriggerProcessor: triggered with {} fields", data.len());

        Ok(NodeOutput::empty()
            .with_value("triggered", true)
            .with_value("timestamp", json!(Utc::now().to_rfc3339()))
            .with_value(Self::PORT_DATA, Value::Object(data)))
    }
}
