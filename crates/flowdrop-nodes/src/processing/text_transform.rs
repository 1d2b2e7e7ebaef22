//! Text Transform Processor

use std::str::FromStr;

use async_trait::async_trait;
use flowdrop_engine::{
    EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::json;

use crate::fields::{lookup, required_present, text_of};

/// Supported transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Uppercase,
    Lowercase,
    Trim,
    Reverse,
    Capitalize,
    TitleCase,
    Slugify,
}

impl FromStr for Transform {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uppercase" => Ok(Self::Uppercase),
            "lowercase" => Ok(Self::Lowercase),
            "trim" => Ok(Self::Trim),
            "reverse" => Ok(Self::Reverse),
            "capitalize" => Ok(Self::Capitalize),
            "title_case" | "titlecase" => Ok(Self::TitleCase),
            "slugify" => Ok(Self::Slugify),
            other => Err(EngineError::failed(format!("Unknown text transform '{}'", other))),
        }
    }
}

impl Transform {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Uppercase => text.to_uppercase(),
            Self::Lowercase => text.to_lowercase(),
            Self::Trim => text.trim().to_string(),
            Self::Reverse => text.chars().rev().collect(),
            Self::Capitalize => capitalize(text),
            Self::TitleCase => text
                .split(' ')
                .map(|word| capitalize(&word.to_lowercase()))
                .collect::<Vec<_>>()
                .join(" "),
            Self::Slugify => {
                let lowered = text.to_lowercase();
                let mut slug = String::with_capacity(lowered.len());
                for c in lowered.chars() {
                    if c.is_alphanumeric() {
                        slug.push(c);
                    } else if !slug.ends_with('-') && !slug.is_empty() {
                        slug.push('-');
                    }
                }
                slug.trim_end_matches('-').to_string()
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Applies a single string transform to input `text`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTransformProcessor;

impl TextTransformProcessor {
    pub const NODE_TYPE: &'static str = "text_transform";
    pub const PORT_TEXT: &'static str = "text";
}

impl ProcessorDescriptor for TextTransformProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Text Transform".to_string(),
            description: "Transforms text (case, trimming, slugs)".to_string(),
            inputs: vec![PortMetadata::required(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            outputs: vec![PortMetadata::optional(
                Self::PORT_TEXT,
                "Text",
                PortDataType::String,
            )],
            config: vec![PortMetadata::required("operation", "Operation", PortDataType::String)
                .with_default(json!("uppercase"))
                .with_options(&[
                    "uppercase",
                    "lowercase",
                    "trim",
                    "reverse",
                    "capitalize",
                    "title_case",
                    "slugify",
                ])],
        }
    }
}

#[async_trait]
impl NodeProcessor for TextTransformProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    fn validate_inputs(&self, inputs: &NodeInput) -> bool {
        required_present(&Self::descriptor(), inputs)
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let text = lookup(inputs, Self::PORT_TEXT).map(text_of).unwrap_or_default();
        let operation = config.get_str_or("operation", "uppercase");
        let transform: Transform = operation.parse()?;

        let result = transform.apply(&text);
        log::debug!("TextTransformProcessor: {} over {} chars", operation, text.len());

        Ok(NodeOutput::empty()
            .with_value(Self::PORT_TEXT, result)
            .with_value("original", text)
            .with_value("operation", operation))
    }
}
