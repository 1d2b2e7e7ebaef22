//! Chat Model Processor
//!
//! Deterministic stand-in for a language model. It answers with the
//! prompt it was given so flows can be built and tested without a model
//! server. The response shape matches what a real provider node returns.

use async_trait::async_trait;
use flowdrop_engine::{
    NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType, PortMetadata,
    ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::json;

use crate::config::ChatModelDefaults;
use crate::fields::{lookup, lookup_or_config, required_present, text_of};

/// Chat Model Processor
///
/// # Inputs
/// - `prompt` (required) - The user message
/// - `systemPrompt` (optional) - Prepended instructions; also read from config
///
/// # Outputs
/// - `response` - Generated text
/// - `model` - Model name used
/// - `usage` - `{promptTokens, completionTokens, totalTokens}` (whitespace tokens)
/// - `id` - Completion id
#[derive(Debug, Clone)]
pub struct ChatModelProcessor {
    defaults: ChatModelDefaults,
}

impl ChatModelProcessor {
    pub const NODE_TYPE: &'static str = "chat_model";
    pub const PORT_PROMPT: &'static str = "prompt";
    pub const PORT_SYSTEM_PROMPT: &'static str = "systemPrompt";
    pub const PORT_RESPONSE: &'static str = "response";

    pub fn new(defaults: ChatModelDefaults) -> Self {
        Self { defaults }
    }

    fn generate(system_prompt: Option<&str>, prompt: &str, max_tokens: Option<usize>) -> String {
        let reply = match system_prompt {
            Some(system) if !system.is_empty() => format!("[{}] {}", system, prompt),
            _ => prompt.to_string(),
        };
        match max_tokens {
            Some(limit) => reply.split_whitespace().take(limit).collect::<Vec<_>>().join(" "),
            None => reply,
        }
    }
}

impl Default for ChatModelProcessor {
    fn default() -> Self {
        Self::new(ChatModelDefaults::default())
    }
}

impl ProcessorDescriptor for ChatModelProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Ai,
            label: "Chat Model".to_string(),
            description: "Generates a chat response".to_string(),
            inputs: vec![
                PortMetadata::required(Self::PORT_PROMPT, "Prompt", PortDataType::String),
                PortMetadata::optional(Self::PORT_SYSTEM_PROMPT, "System prompt", PortDataType::String),
            ],
            outputs: vec![
                PortMetadata::optional(Self::PORT_RESPONSE, "Response", PortDataType::String),
                PortMetadata::optional("model", "Model", PortDataType::String),
                PortMetadata::optional("usage", "Usage", PortDataType::Json),
            ],
            config: vec![
                PortMetadata::optional("model", "Model", PortDataType::String),
                PortMetadata::optional("temperature", "Temperature", PortDataType::Number),
                PortMetadata::optional("maxTokens", "Max tokens", PortDataType::Number),
                PortMetadata::optional(Self::PORT_SYSTEM_PROMPT, "System prompt", PortDataType::String),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for ChatModelProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    fn validate_inputs(&self, inputs: &NodeInput) -> bool {
        required_present(&Self::descriptor(), inputs)
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let prompt = lookup(inputs, Self::PORT_PROMPT).map(text_of).unwrap_or_default();
        let system_prompt = lookup_or_config(inputs, config, Self::PORT_SYSTEM_PROMPT).map(text_of);
        let model = config.get_str_or("model", &self.defaults.model).to_string();
        let temperature = config.get_f64("temperature").unwrap_or(self.defaults.temperature);
        let max_tokens = config.get_f64("maxTokens").filter(|n| *n >= 1.0).map(|n| n as usize);

        log::debug!(
            "ChatModelProcessor: model '{}' (temperature {}) with {} char prompt",
            model,
            temperature,
            prompt.len()
        );

        let response = Self::generate(system_prompt.as_deref(), &prompt, max_tokens);
        let prompt_tokens = prompt.split_whitespace().count();
        let completion_tokens = response.split_whitespace().count();

        Ok(NodeOutput::empty()
            .with_value(Self::PORT_RESPONSE, response)
            .with_value("model", model)
            .with_value("temperature", json!(temperature))
            .with_value(
                "usage",
                json!({
                    "promptTokens": prompt_tokens,
                    "completionTokens": completion_tokens,
                    "totalTokens": prompt_tokens + completion_tokens,
                }),
            )
            .with_value("id", format!("chatcmpl-{}", uuid::Uuid::new_v4()))
            .with_value("created", chrono::Utc::now().timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(text: &str) -> NodeInput {
        [("prompt".to_string(), json!(text))].into_iter().collect()
    }

    #[tokio::test]
    async fn test_echoes_prompt_with_default_model() {
        let output = ChatModelProcessor::default()
            .process(&prompt("summarize this please"), &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("response"), Some(&json!("summarize this please")));
        assert_eq!(output.get("model"), Some(&json!("flowdrop-echo")));
        assert_eq!(output.get("usage").unwrap()["totalTokens"], json!(6));
        assert!(output.get("id").unwrap().as_str().unwrap().starts_with("chatcmpl-"));
    }

    #[tokio::test]
    async fn test_config_overrides() {
        let config = NodeConfig::from_value(&json!({
            "model": "custom",
            "systemPrompt": "terse",
            "maxTokens": 2
        }));
        let output = ChatModelProcessor::default()
            .process(&prompt("one two three"), &config)
            .await
            .unwrap();
        assert_eq!(output.get("response"), Some(&json!("[terse] one")));
        assert_eq!(output.get("model"), Some(&json!("custom")));
    }

    #[test]
    fn test_prompt_required() {
        assert!(!ChatModelProcessor::default().validate_inputs(&NodeInput::default()));
        assert!(ChatModelProcessor::default().validate_inputs(&prompt("hi")));
    }
}
