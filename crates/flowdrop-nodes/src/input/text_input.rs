//! Text Input Processor
//!
//! Provides text to the workflow. A connected or initial `text` value wins
//! over the configured default.

use async_trait::async_trait;
use flowdrop_engine::{
    NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType, PortMetadata,
    ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::json;

use crate::fields::{lookup, text_of};

/// Text Input Processor
///
/// # Inputs
/// - `text` (optional) - Text from upstream or the run's initial data
///
/// # Outputs
/// - `text` - The text (config `defaultText`, else empty string)
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInputProcessor;

impl TextInputProcessor {
    pub const NODE_TYPE: &'static str = "text_input";
    /// Port ID for text input and output
    pub const PORT_TEXT: &'static str = "text";
}

impl ProcessorDescriptor for TextInputProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Input,
            label: "Text Input".to_string(),
            description: "Provides text input to the workflow".to_string(),
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
            config: vec![
                PortMetadata::optional("defaultText", "Default text", PortDataType::String),
                PortMetadata::optional("placeholder", "Placeholder", PortDataType::String),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for TextInputProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let text = lookup(inputs, Self::PORT_TEXT)
            .map(text_of)
            .or_else(|| config.get_str("defaultText").map(str::to_string))
            .unwrap_or_default();

        log::debug!("TextInputProcessor: passing through {} chars", text.len());

        Ok(NodeOutput::empty()
            .with_value(Self::PORT_TEXT, text.clone())
            .with_value("length", json!(text.chars().count())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_text() {
        let inputs: NodeInput = [("text".to_string(), json!("Hello, world!"))]
            .into_iter()
            .collect();
        let output = TextInputProcessor
            .process(&inputs, &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!("Hello, world!")));
        assert_eq!(output.get("length"), Some(&json!(13)));
    }

    #[tokio::test]
    async fn test_default_text_from_config() {
        let output = TextInputProcessor
            .process(
                &NodeInput::default(),
                &NodeConfig::from_value(&json!({"defaultText": "fallback"})),
            )
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!("fallback")));
    }

    #[tokio::test]
    async fn test_empty_when_nothing_provided() {
        let output = TextInputProcessor
            .process(&NodeInput::default(), &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!("")));
    }

    #[test]
    fn test_descriptor() {
        let meta = TextInputProcessor::descriptor();
        assert_eq!(meta.node_type, "text_input");
        assert_eq!(meta.category, NodeCategory::Input);
        assert!(meta.required_inputs().next().is_none());
    }
}
