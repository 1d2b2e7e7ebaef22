//! Text Output Processor
//!
//! Terminal node that displays text. Non-string values are rendered as
//! JSON so any upstream output can be shown.

use async_trait::async_trait;
use flowdrop_engine::types::DEFAULT_PORT;
use flowdrop_engine::{
    NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType, PortMetadata,
    ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::Value;

use crate::fields::{lookup, text_of};

/// Text Output Processor
///
/// # Inputs
/// - `text` (optional) - Text to display; falls back to a legacy `default` input
///
/// # Outputs
/// - `text` - The rendered text
/// - `format` - Configured display format (`text` or `markdown`)
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOutputProcessor;

impl TextOutputProcessor {
    pub const NODE_TYPE: &'static str = "text_output";
    pub const PORT_TEXT: &'static str = "text";
}

impl ProcessorDescriptor for TextOutputProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Output,
            label: "Text Output".to_string(),
            description: "Displays text output".to_string(),
            inputs: vec![PortMetadata::optional(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            outputs: vec![PortMetadata::optional(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            config: vec![PortMetadata::optional("format", "Format", PortDataType::String)
                .with_default(Value::from("text"))
                .with_options(&["text", "markdown"])],
        }
    }
}

#[async_trait]
impl NodeProcessor for TextOutputProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let text = lookup(inputs, Self::PORT_TEXT)
            .or_else(|| inputs.get(DEFAULT_PORT))
            .map(text_of)
            .unwrap_or_default();

        log::debug!("TextOutputProcessor: displaying {} chars", text.len());

        Ok(NodeOutput::empty()
            .with_value(Self::PORT_TEXT, text)
            .with_value("format", config.get_str_or("format", "text")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_display_text() {
        let inputs: NodeInput = [("text".to_string(), json!("done"))].into_iter().collect();
        let output = TextOutputProcessor
            .process(&inputs, &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!("done")));
        assert_eq!(output.get("format"), Some(&json!("text")));
    }

    #[tokio::test]
    async fn test_legacy_default_input_rendered_as_json() {
        let inputs: NodeInput = [("default".to_string(), json!({"count": 2}))]
            .into_iter()
            .collect();
        let output = TextOutputProcessor
            .process(&inputs, &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!(r#"{"count":2}"#)));
    }

    #[tokio::test]
    async fn test_missing_text_is_empty() {
        let output = TextOutputProcessor
            .process(&NodeInput::default(), &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!("")));
    }
}
