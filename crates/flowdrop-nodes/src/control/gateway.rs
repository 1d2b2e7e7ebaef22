//! Multi-branch Gateway Processor
//!
//! Evaluates an ordered list of branch conditions against input `value`.
//! With `matchMode = "first"` (the default) the first matching branch
//! wins; with `"all"` every matching branch is activated. When nothing
//! matches, `defaultBranch` is used if configured, otherwise the node
//! emits `NoBranch` and every trigger edge leaving it stays inactive.

use async_trait::async_trait;
use flowdrop_engine::{
    ControlSignal, EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor,
    PortDataType, PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::compare::Operator;
use crate::fields::lookup;

/// One configured branch
#[derive(Debug, Clone, Deserialize)]
pub struct BranchCondition {
    pub name: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

fn default_operator() -> String {
    "equals".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    First,
    All,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayConfig {
    #[serde(default)]
    branches: Vec<BranchCondition>,
    #[serde(default = "default_match_mode")]
    match_mode: MatchMode,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    case_sensitive: bool,
}

fn default_match_mode() -> MatchMode {
    MatchMode::First
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayProcessor;

impl GatewayProcessor {
    pub const NODE_TYPE: &'static str = "gateway";
    pub const PORT_VALUE: &'static str = "value";
}

impl ProcessorDescriptor for GatewayProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Control,
            label: "Gateway".to_string(),
            description: "Routes execution to the branches whose condition matches".to_string(),
            inputs: vec![PortMetadata::optional(
                Self::PORT_VALUE,
                "Value",
                PortDataType::Any,
            )],
            outputs: vec![PortMetadata::optional(
                "matched_branches",
                "Matched branches",
                PortDataType::Array,
            )],
            config: vec![
                PortMetadata::required("branches", "Branches", PortDataType::Array),
                PortMetadata::optional("matchMode", "Match mode", PortDataType::String)
                    .with_default(json!("first"))
                    .with_options(&["first", "all"]),
                PortMetadata::optional("defaultBranch", "Default branch", PortDataType::String),
                PortMetadata::optional("caseSensitive", "Case sensitive", PortDataType::Boolean)
                    .with_default(json!(false)),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for GatewayProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let config: GatewayConfig = config
            .deserialize()
            .map_err(|e| EngineError::failed(format!("Invalid gateway config: {}", e)))?;
        let value = lookup(inputs, Self::PORT_VALUE).cloned().unwrap_or(Value::Null);

        let mut matched: Vec<String> = Vec::new();
        for branch in &config.branches {
            let operator: Operator = branch.operator.parse()?;
            if operator.evaluate(&value, &branch.value, config.case_sensitive)? {
                matched.push(branch.name.clone());
                if config.match_mode == MatchMode::First {
                    break;
                }
            }
        }

        let used_default = matched.is_empty() && config.default_branch.is_some();
        let signal = match (matched.is_empty(), config.default_branch) {
            (false, _) => ControlSignal::ActiveBranches(matched.clone()),
            (true, Some(default)) => ControlSignal::branch(default),
            (true, None) => ControlSignal::NoBranch,
        };

        log::debug!("GatewayProcessor: {} -> {:?}", value, signal);

        Ok(NodeOutput::empty()
            .with_value("matched_branches", json!(matched))
            .with_value("usedDefault", used_default)
            .with_value(Self::PORT_VALUE, value)
            .with_control(signal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(v: Value) -> NodeInput {
        [("value".to_string(), v)].into_iter().collect()
    }

    fn config(extra: Value) -> NodeConfig {
        let mut base = json!({
            "branches": [
                {"name": "small", "operator": "<", "value": 10},
                {"name": "medium", "operator": "<", "value": 100},
                {"name": "exact", "operator": "==", "value": 5}
            ]
        });
        if let (Some(base), Value::Object(extra)) = (base.as_object_mut(), extra) {
            base.extend(extra);
        }
        NodeConfig::from_value(&base)
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let output = GatewayProcessor
            .process(&value(json!(5)), &config(json!({})))
            .await
            .unwrap();
        assert_eq!(output.control, Some(ControlSignal::branch("small")));
        assert_eq!(output.get("matched_branches"), Some(&json!(["small"])));
    }

    #[tokio::test]
    async fn test_all_matches() {
        let output = GatewayProcessor
            .process(&value(json!(5)), &config(json!({"matchMode": "all"})))
            .await
            .unwrap();
        assert_eq!(
            output.control,
            Some(ControlSignal::ActiveBranches(vec![
                "small".into(),
                "medium".into(),
                "exact".into()
            ]))
        );
        assert_eq!(output.get("active_branches"), Some(&json!(["small", "medium", "exact"])));
    }

    #[tokio::test]
    async fn test_default_branch() {
        let output = GatewayProcessor
            .process(&value(json!(500)), &config(json!({"defaultBranch": "large"})))
            .await
            .unwrap();
        assert_eq!(output.control, Some(ControlSignal::branch("large")));
        assert_eq!(output.get("usedDefault"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_no_match_is_no_branch() {
        let output = GatewayProcessor
            .process(&value(json!(500)), &config(json!({})))
            .await
            .unwrap();
        assert_eq!(output.control, Some(ControlSignal::NoBranch));
        assert_eq!(output.get("active_branches"), Some(&json!("")));
    }

    #[tokio::test]
    async fn test_bad_operator_is_an_error() {
        let config = NodeConfig::from_value(&json!({
            "branches": [{"name": "x", "operator": "about", "value": 1}]
        }));
        assert!(GatewayProcessor.process(&value(json!(1)), &config).await.is_err());
    }
}
