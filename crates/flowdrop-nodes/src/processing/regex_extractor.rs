//! Regex Extractor Processor
//!
//! Extracts matches of a configured pattern from input `text`.

use async_trait::async_trait;
use flowdrop_engine::{
    EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use regex::{Regex, RegexBuilder};
use serde_json::{json, Map, Value};

use crate::fields::{lookup, required_present, text_of};

/// Regex Extractor Processor
///
/// # Config
/// - `pattern` (required)
/// - `flags` - any of `i` (case-insensitive), `m` (multi-line), `s` (dot matches newline)
/// - `mode` - `all` (default) or `first`
///
/// # Outputs
/// - `matches` - every full match
/// - `match` - the first match or `null`
/// - `groups` - capture groups of the first match (named groups by name)
/// - `count`
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractorProcessor;

impl RegexExtractorProcessor {
    pub const NODE_TYPE: &'static str = "regex_extractor";
    pub const PORT_TEXT: &'static str = "text";
    pub const PORT_MATCHES: &'static str = "matches";
}

/// Compile a pattern with `i`/`m`/`s` flags
pub(crate) fn build_regex(pattern: &str, flags: &str) -> flowdrop_engine::Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| EngineError::failed(format!("Invalid regex '{}': {}", pattern, e)))
}

impl ProcessorDescriptor for RegexExtractorProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Regex Extractor".to_string(),
            description: "Extracts text matching a regular expression".to_string(),
            inputs: vec![PortMetadata::required(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            outputs: vec![
                PortMetadata::optional(Self::PORT_MATCHES, "Matches", PortDataType::Array),
                PortMetadata::optional("match", "First match", PortDataType::String),
                PortMetadata::optional("groups", "Groups", PortDataType::Json),
                PortMetadata::optional("count", "Count", PortDataType::Number),
            ],
            config: vec![
                PortMetadata::required("pattern", "Pattern", PortDataType::String),
                PortMetadata::optional("flags", "Flags", PortDataType::String),
                PortMetadata::optional("mode", "Mode", PortDataType::String)
                    .with_default(json!("all"))
                    .with_options(&["all", "first"]),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for RegexExtractorProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    fn validate_inputs(&self, inputs: &NodeInput) -> bool {
        required_present(&Self::descriptor(), inputs)
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let text = lookup(inputs, Self::PORT_TEXT).map(text_of).unwrap_or_default();
        let pattern = config
            .get_str("pattern")
            .ok_or_else(|| EngineError::failed("regex_extractor requires a 'pattern'"))?;
        let regex = build_regex(pattern, config.get_str_or("flags", ""))?;
        let first_only = config.get_str_or("mode", "all") == "first";

        let mut matches: Vec<Value> = Vec::new();
        for m in regex.find_iter(&text) {
            matches.push(json!(m.as_str()));
            if first_only {
                break;
            }
        }

        let mut groups = Map::new();
        if let Some(captures) = regex.captures(&text) {
            for (index, name) in regex.capture_names().enumerate().skip(1) {
                let key = name.map(str::to_string).unwrap_or_else(|| index.to_string());
                let value = captures
                    .get(index)
                    .map(|m| json!(m.as_str()))
                    .unwrap_or(Value::Null);
                groups.insert(key, value);
            }
        }

        log::debug!("RegexExtractorProcessor: {} matches for /{}/", matches.len(), pattern);

        Ok(NodeOutput::empty()
            .with_value("match", matches.first().cloned().unwrap_or(Value::Null))
            .with_value("count", json!(matches.len()))
            .with_value(Self::PORT_MATCHES, Value::Array(matches))
            .with_value("groups", Value::Object(groups)))
    }
}
