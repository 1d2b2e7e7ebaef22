//! If/Else Processor
//!
//! Compares input `text` against the configured `matchText` and routes to
//! the `true` or `false` branch. Comparison is case-insensitive unless
//! `caseSensitive` is set.

use async_trait::async_trait;
use flowdrop_engine::{
    ControlSignal, EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor,
    PortDataType, PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::json;

use super::compare::Operator;
use crate::fields::{lookup, text_of};

#[derive(Debug, Clone, Copy, Default)]
pub struct IfElseProcessor;

impl IfElseProcessor {
    pub const NODE_TYPE: &'static str = "if_else";
    pub const PORT_TEXT: &'static str = "text";
}

impl ProcessorDescriptor for IfElseProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Control,
            label: "If / Else".to_string(),
            description: "Routes execution by comparing text".to_string(),
            inputs: vec![PortMetadata::optional(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            outputs: vec![
                PortMetadata::optional("true", "True", PortDataType::Trigger),
                PortMetadata::optional("false", "False", PortDataType::Trigger),
                PortMetadata::optional("result", "Result", PortDataType::Boolean),
                PortMetadata::optional(Self::PORT_TEXT, "Text", PortDataType::String),
            ],
            config: vec![
                PortMetadata::optional("matchText", "Match text", PortDataType::String),
                PortMetadata::optional("operator", "Operator", PortDataType::String)
                    .with_default(json!("equals"))
                    .with_options(&[
                        "equals",
                        "not_equals",
                        "contains",
                        "starts_with",
                        "ends_with",
                        "regex",
                    ]),
                PortMetadata::optional("caseSensitive", "Case sensitive", PortDataType::Boolean)
                    .with_default(json!(false)),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for IfElseProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let text = lookup(inputs, Self::PORT_TEXT).map(text_of).unwrap_or_default();
        let match_text = config.get("matchText").map(text_of).unwrap_or_default();
        let operator: Operator = config.get_str_or("operator", "equals").parse()?;
        if !operator.is_text_operator() {
            return Err(EngineError::failed(format!(
                "Operator {:?} is not supported by if_else",
                operator
            )));
        }
        let case_sensitive = config.get_bool_or("caseSensitive", false);

        let result = operator.evaluate_text(&text, &match_text, case_sensitive)?;
        log::debug!(
            "IfElseProcessor: '{}' {:?} '{}' -> {}",
            text,
            operator,
            match_text,
            result
        );

        Ok(NodeOutput::empty()
            .with_value("result", result)
            .with_value(Self::PORT_TEXT, text)
            .with_control(ControlSignal::boolean(result)))
    }
}
