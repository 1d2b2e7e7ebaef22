//! Node processor contract
//!
//! A processor implements one node type. It receives immutable input and
//! config value objects built fresh for each invocation and returns a
//! `NodeOutput`: plain data plus an optional `ControlSignal` that gateway
//! processors use to select downstream branches.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::ProcessorMetadata;
use crate::error::{EngineError, Result};

/// Output field gateways mirror their branch selection into
pub const ACTIVE_BRANCHES_FIELD: &str = "active_branches";

/// Resolved inputs for one node invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeInput(Map<String, Value>);

impl NodeInput {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string input, ignoring non-string values
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Get a numeric input, accepting numeric strings
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(value_as_f64)
    }

    /// Check whether a non-null value is present for `key`
    pub fn has(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for NodeInput {
    fn from(values: Map<String, Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<(String, Value)> for NodeInput {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Static configuration for one node invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeConfig(Map<String, Value>);

impl NodeConfig {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    /// Build from a node's raw `config` value.
    ///
    /// `null` yields an empty config; a non-object scalar is kept under `value`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::Object(map) => Self(map.clone()),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other.clone());
                Self(map)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(value_as_f64)
    }

    /// Deserialize the whole config into a typed struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(EngineError::from)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Branch selection emitted by gateway processors
///
/// The orchestrator interprets this signal; processors never decide
/// which downstream nodes run themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "branches", rename_all = "snake_case")]
pub enum ControlSignal {
    /// Activates trigger edges leaving through one of these branches
    ActiveBranches(Vec<String>),
    /// Nothing matched; every trigger edge from this node stays inactive
    NoBranch,
}

impl ControlSignal {
    /// Select a single branch
    pub fn branch(name: impl Into<String>) -> Self {
        Self::ActiveBranches(vec![name.into()])
    }

    /// Select the `"true"` or `"false"` branch
    pub fn boolean(value: bool) -> Self {
        Self::branch(if value { "true" } else { "false" })
    }

    /// Check whether a branch name is active (exact, case-sensitive)
    pub fn activates(&self, branch: &str) -> bool {
        match self {
            Self::ActiveBranches(branches) => branches.iter().any(|b| b == branch),
            Self::NoBranch => false,
        }
    }

    pub fn branches(&self) -> &[String] {
        match self {
            Self::ActiveBranches(branches) => branches,
            Self::NoBranch => &[],
        }
    }

    /// Read a legacy `active_branches` field (string or array of strings)
    pub fn from_active_branches(value: &Value) -> Option<Self> {
        let branches: Vec<String> = match value {
            Value::String(s) if s.is_empty() => Vec::new(),
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Value::Null => Vec::new(),
            _ => return None,
        };

        if branches.is_empty() {
            Some(Self::NoBranch)
        } else {
            Some(Self::ActiveBranches(branches))
        }
    }

    /// Value written to the `active_branches` output field
    pub fn to_active_branches(&self) -> Value {
        match self.branches() {
            [] => Value::String(String::new()),
            [single] => Value::String(single.clone()),
            many => Value::from(many.to_vec()),
        }
    }
}

/// Data and control output of a processor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput {
    /// Output values keyed by port id
    pub data: Map<String, Value>,
    /// Branch selection for gateway processors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlSignal>,
}

impl NodeOutput {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            control: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Add one output value
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach a control signal, mirroring it into `active_branches`
    pub fn with_control(mut self, signal: ControlSignal) -> Self {
        self.data
            .insert(ACTIVE_BRANCHES_FIELD.to_string(), signal.to_active_branches());
        self.control = Some(signal);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The data map as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

/// A pluggable unit executing one node type
///
/// Processors are registered under their `node_type` in a
/// [`ProcessorRegistry`](crate::registry::ProcessorRegistry).
#[async_trait]
pub trait NodeProcessor: Send + Sync {
    /// Ports, config fields and labels of this processor
    fn metadata(&self) -> ProcessorMetadata;

    /// Check inputs before `process` runs.
    ///
    /// The default requires every required input port to be present.
    fn validate_inputs(&self, inputs: &NodeInput) -> bool {
        self.metadata().required_inputs().all(|port| inputs.has(port))
    }

    fn input_schema(&self) -> Value {
        self.metadata().input_schema()
    }

    fn output_schema(&self) -> Value {
        self.metadata().output_schema()
    }

    fn config_schema(&self) -> Value {
        self.metadata().config_schema()
    }

    /// Run the node
    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> Result<NodeOutput>;
}

/// Interpret a JSON value as a number, accepting numeric strings
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Truthiness used by boolean gateways and conditionals
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && !matches!(s.to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off")
        }
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_control_signal_matching_is_exact() {
        let signal = ControlSignal::boolean(true);
        assert!(signal.activates("true"));
        assert!(!signal.activates("True"));
        assert!(!signal.activates("false"));
        assert!(!ControlSignal::NoBranch.activates("true"));
    }

    #[test]
    fn test_control_signal_from_legacy_field() {
        assert_eq!(
            ControlSignal::from_active_branches(&json!("approved")),
            Some(ControlSignal::branch("approved"))
        );
        assert_eq!(
            ControlSignal::from_active_branches(&json!(["a", "b"])),
            Some(ControlSignal::ActiveBranches(vec!["a".into(), "b".into()]))
        );
        assert_eq!(
            ControlSignal::from_active_branches(&json!("")),
            Some(ControlSignal::NoBranch)
        );
        assert_eq!(ControlSignal::from_active_branches(&json!(42)), None);
    }

    #[test]
    fn test_with_control_mirrors_field() {
        let output = NodeOutput::empty()
            .with_value("result", true)
            .with_control(ControlSignal::boolean(true));
        assert_eq!(output.get(ACTIVE_BRANCHES_FIELD), Some(&json!("true")));
        assert_eq!(output.control, Some(ControlSignal::boolean(true)));
    }

    #[test]
    fn test_config_from_value() {
        assert!(NodeConfig::from_value(&Value::Null).values().is_empty());
        let config = NodeConfig::from_value(&json!({"operator": "equals", "caseSensitive": true}));
        assert_eq!(config.get_str_or("operator", "contains"), "equals");
        assert!(config.get_bool_or("caseSensitive", false));
        assert_eq!(NodeConfig::from_value(&json!(5)).get_f64("value"), Some(5.0));
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!([1])));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(value_as_f64(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(value_as_f64(&json!(3)), Some(3.0));
        assert_eq!(value_as_f64(&json!({})), None);
    }
}
