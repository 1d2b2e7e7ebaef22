//! Concat Texts Processor

use async_trait::async_trait;
use flowdrop_engine::{
    NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType, PortMetadata,
    ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::{json, Value};

use crate::fields::{lookup_or_config, text_of};

/// Joins `text1`, `text2` and any `texts` array with a separator
///
/// Each input falls back to the same-named config field. Missing parts
/// are left out rather than joined as empty strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatTextsProcessor;

impl ConcatTextsProcessor {
    pub const NODE_TYPE: &'static str = "concat_texts";
    pub const PORT_TEXT1: &'static str = "text1";
    pub const PORT_TEXT2: &'static str = "text2";
    pub const PORT_TEXTS: &'static str = "texts";
    pub const PORT_TEXT: &'static str = "text";
}

impl ProcessorDescriptor for ConcatTextsProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Concat Texts".to_string(),
            description: "Concatenates texts with a separator".to_string(),
            inputs: vec![
                PortMetadata::optional(Self::PORT_TEXT1, "First", PortDataType::String),
                PortMetadata::optional(Self::PORT_TEXT2, "Second", PortDataType::String),
                PortMetadata::optional(Self::PORT_TEXTS, "More texts", PortDataType::Array),
            ],
            outputs: vec![PortMetadata::optional(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            config: vec![
                PortMetadata::optional("separator", "Separator", PortDataType::String)
                    .with_default(json!("")),
                PortMetadata::optional(Self::PORT_TEXT1, "First", PortDataType::String),
                PortMetadata::optional(Self::PORT_TEXT2, "Second", PortDataType::String),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for ConcatTextsProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let separator = config.get_str_or("separator", "");

        let mut parts: Vec<String> = [Self::PORT_TEXT1, Self::PORT_TEXT2]
            .iter()
            .filter_map(|port| lookup_or_config(inputs, config, port))
            .map(text_of)
            .collect();
        match lookup_or_config(inputs, config, Self::PORT_TEXTS) {
            Some(Value::Array(items)) => parts.extend(items.iter().map(text_of)),
            Some(single) => parts.push(text_of(single)),
            None => {}
        }

        let text = parts.join(separator);
        log::debug!("ConcatTextsProcessor: joined {} parts", parts.len());

        Ok(NodeOutput::empty()
            .with_value(Self::PORT_TEXT, text)
            .with_value("parts", json!(parts.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concat_with_separator() {
        let inputs: NodeInput = [
            ("text1".to_string(), json!("Hello")),
            ("texts".to_string(), json!(["again", 2])),
        ]
        .into_iter()
        .collect();
        let config = NodeConfig::from_value(&json!({"separator": " ", "text2": "world"}));

        let output = ConcatTextsProcessor.process(&inputs, &config).await.unwrap();
        assert_eq!(output.get("text"), Some(&json!("Hello world again 2")));
        assert_eq!(output.get("parts"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn test_nothing_to_join() {
        let output = ConcatTextsProcessor
            .process(&NodeInput::default(), &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("text"), Some(&json!("")));
    }
}
