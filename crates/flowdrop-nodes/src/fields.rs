//! Input lookup shared by built-in processors
//!
//! Legacy connections deliver the whole upstream output under the
//! `default` port, so a named input is also searched for inside that
//! object. Some inputs may fall back to a same-named config field.

use flowdrop_engine::types::DEFAULT_PORT;
use flowdrop_engine::{NodeConfig, NodeInput, ProcessorMetadata};
use serde_json::Value;

/// Find a non-null input value, looking inside `default` when needed
pub(crate) fn lookup<'a>(inputs: &'a NodeInput, key: &str) -> Option<&'a Value> {
    inputs.get(key).filter(|v| !v.is_null()).or_else(|| {
        match inputs.get(DEFAULT_PORT) {
            Some(Value::Object(map)) => map.get(key).filter(|v| !v.is_null()),
            _ => None,
        }
    })
}

/// Like [`lookup`], falling back to the config field of the same name
pub(crate) fn lookup_or_config<'a>(
    inputs: &'a NodeInput,
    config: &'a NodeConfig,
    key: &str,
) -> Option<&'a Value> {
    lookup(inputs, key).or_else(|| config.get(key).filter(|v| !v.is_null()))
}

/// Check required ports, accepting values nested in `default`
pub(crate) fn required_present(metadata: &ProcessorMetadata, inputs: &NodeInput) -> bool {
    metadata
        .required_inputs()
        .all(|port| lookup(inputs, port).is_some())
}

/// Render a value as plain text
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
