//! Processor descriptors and JSON Schema generation
//!
//! Every processor describes its ports and configuration fields with
//! `ProcessorMetadata`. The same metadata drives registry listings,
//! default input validation, and the JSON Schemas the editor consumes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// The data type of a port or config field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDataType {
    /// Accepts any type
    Any,
    /// Text string
    String,
    /// Numeric value
    Number,
    /// Boolean value
    Boolean,
    /// JSON object
    Json,
    /// Array of values
    Array,
    /// Control-flow trigger (no payload)
    Trigger,
}

impl PortDataType {
    /// JSON Schema `type` keyword for this data type
    pub fn json_schema_type(&self) -> Option<&'static str> {
        match self {
            PortDataType::Any | PortDataType::Trigger => None,
            PortDataType::String => Some("string"),
            PortDataType::Number => Some("number"),
            PortDataType::Boolean => Some("boolean"),
            PortDataType::Json => Some("object"),
            PortDataType::Array => Some("array"),
        }
    }
}

/// Category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Inputs and triggers that start a flow
    Input,
    /// Display or export of results
    Output,
    /// Text and data transforms
    Processing,
    /// Gateways and conditionals
    Control,
    /// Outbound HTTP integrations
    Http,
    /// Language model calls
    Ai,
}

/// Metadata for a port or config field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMetadata {
    /// Port identifier (the key in the input/output/config map)
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Data type
    pub data_type: PortDataType,
    /// Whether this field is required
    pub required: bool,
    /// Default value, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Allowed values for enumerated fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl PortMetadata {
    /// Create a new port metadata
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        data_type: PortDataType,
        required: bool,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type,
            required,
            default_value: None,
            options: Vec::new(),
        }
    }

    /// Create a required port
    pub fn required(id: impl Into<String>, label: impl Into<String>, data_type: PortDataType) -> Self {
        Self::new(id, label, data_type, true)
    }

    /// Create an optional port
    pub fn optional(id: impl Into<String>, label: impl Into<String>, data_type: PortDataType) -> Self {
        Self::new(id, label, data_type, false)
    }

    /// Set a default value
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Restrict to a fixed set of values
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    fn to_schema(&self) -> Value {
        let mut schema = Map::new();
        if let Some(ty) = self.data_type.json_schema_type() {
            schema.insert("type".to_string(), json!(ty));
        }
        schema.insert("title".to_string(), json!(self.label));
        if let Some(default) = &self.default_value {
            schema.insert("default".to_string(), default.clone());
        }
        if !self.options.is_empty() {
            schema.insert("enum".to_string(), json!(self.options));
        }
        Value::Object(schema)
    }
}

/// Complete metadata for a processor type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorMetadata {
    /// Unique type identifier (e.g., "if_else")
    pub node_type: String,
    /// Category for grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the processor does
    pub description: String,
    /// Input port definitions
    pub inputs: Vec<PortMetadata>,
    /// Output port definitions
    pub outputs: Vec<PortMetadata>,
    /// Configuration field definitions
    #[serde(default)]
    pub config: Vec<PortMetadata>,
}

impl ProcessorMetadata {
    /// JSON Schema describing the inputs
    pub fn input_schema(&self) -> Value {
        object_schema(&self.inputs)
    }

    /// JSON Schema describing the outputs
    pub fn output_schema(&self) -> Value {
        object_schema(&self.outputs)
    }

    /// JSON Schema describing the configuration
    pub fn config_schema(&self) -> Value {
        object_schema(&self.config)
    }

    /// Ids of required input ports
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter(|p| p.required)
            .map(|p| p.id.as_str())
    }
}

/// Trait for processors that can describe their metadata statically
pub trait ProcessorDescriptor {
    /// Get the static metadata for this processor type
    fn descriptor() -> ProcessorMetadata
    where
        Self: Sized;
}

fn object_schema(ports: &[PortMetadata]) -> Value {
    let properties: Map<String, Value> = ports
        .iter()
        .map(|p| (p.id.clone(), p.to_schema()))
        .collect();
    let required: Vec<&str> = ports
        .iter()
        .filter(|p| p.required)
        .map(|p| p.id.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
