//! Calculator Processor

use std::str::FromStr;

use async_trait::async_trait;
use flowdrop_engine::processor::value_as_f64;
use flowdrop_engine::{
    EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::json;

use crate::fields::lookup_or_config;

/// Arithmetic operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl FromStr for Operation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" | "+" => Ok(Self::Add),
            "subtract" | "-" => Ok(Self::Subtract),
            "multiply" | "*" => Ok(Self::Multiply),
            "divide" | "/" => Ok(Self::Divide),
            "modulo" | "%" => Ok(Self::Modulo),
            "power" | "^" => Ok(Self::Power),
            other => Err(EngineError::failed(format!("Unknown operation '{}'", other))),
        }
    }
}

impl Operation {
    /// Apply to two operands. Division or modulo by zero is an error.
    pub fn apply(&self, a: f64, b: f64) -> flowdrop_engine::Result<f64> {
        match self {
            Self::Add => Ok(a + b),
            Self::Subtract => Ok(a - b),
            Self::Multiply => Ok(a * b),
            Self::Divide | Self::Modulo if b == 0.0 => {
                Err(EngineError::failed("Division by zero"))
            }
            Self::Divide => Ok(a / b),
            Self::Modulo => Ok(a % b),
            Self::Power => Ok(a.powf(b)),
        }
    }
}

/// Applies an arithmetic operation to inputs `a` and `b`
///
/// Operands may be numbers or numeric strings and fall back to config.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculatorProcessor;

impl CalculatorProcessor {
    pub const NODE_TYPE: &'static str = "calculator";
    pub const PORT_A: &'static str = "a";
    pub const PORT_B: &'static str = "b";
    pub const PORT_RESULT: &'static str = "result";

    fn operand(inputs: &NodeInput, config: &NodeConfig, port: &str) -> flowdrop_engine::Result<f64> {
        let value = lookup_or_config(inputs, config, port)
            .ok_or_else(|| EngineError::MissingInput(port.to_string()))?;
        value_as_f64(value)
            .ok_or_else(|| EngineError::failed(format!("Operand '{}' is not a number: {}", port, value)))
    }
}

impl ProcessorDescriptor for CalculatorProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Calculator".to_string(),
            description: "Performs arithmetic on two numbers".to_string(),
            inputs: vec![
                PortMetadata::optional(Self::PORT_A, "A", PortDataType::Number),
                PortMetadata::optional(Self::PORT_B, "B", PortDataType::Number),
            ],
            outputs: vec![PortMetadata::optional(
                Self::PORT_RESULT,
                "Result",
                PortDataType::Number,
            )],
            config: vec![
                PortMetadata::required("operation", "Operation", PortDataType::String)
                    .with_default(json!("add"))
                    .with_options(&["add", "subtract", "multiply", "divide", "modulo", "power"]),
                PortMetadata::optional(Self::PORT_A, "A", PortDataType::Number),
                PortMetadata::optional(Self::PORT_B, "B", PortDataType::Number),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for CalculatorProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let operation: Operation = config.get_str_or("operation", "add").parse()?;
        let a = Self::operand(inputs, config, Self::PORT_A)?;
        let b = Self::operand(inputs, config, Self::PORT_B)?;
        let result = operation.apply(a, b)?;

        log::debug!("CalculatorProcessor: {:?}({}, {}) = {}", operation, a, b, result);

        Ok(NodeOutput::empty()
            .with_value(Self::PORT_RESULT, json!(result))
            .with_value("expression", format!("{} {:?} {}", a, operation, b)))
    }
}
