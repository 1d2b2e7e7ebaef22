//! Orchestrator configuration

use serde::{Deserialize, Serialize};

/// What to do with a node whose data source failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDependencyPolicy {
    /// Record the node as failed without running it
    #[default]
    Fail,
    /// Record the node as skipped without running it
    Skip,
}

/// Defaults applied to every run of an orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Keep executing after a node fails
    pub continue_on_error: bool,
    pub missing_dependency_policy: MissingDependencyPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            missing_dependency_policy: MissingDependencyPolicy::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: OrchestratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert!(config.continue_on_error);
    }

    #[test]
    fn test_policy_parses_snake_case() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{"missing_dependency_policy": "skip"}"#).unwrap();
        assert_eq!(config.missing_dependency_policy, MissingDependencyPolicy::Skip);
        assert!(config.continue_on_error);
    }
}
