//! Runner configuration
//!
//! Loaded from a JSON file. Every section is optional and falls back to
//! its defaults.

use std::path::{Path, PathBuf};

use flowdrop_engine::OrchestratorConfig;
use flowdrop_nodes::NodesConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "flowdrop.json";

/// Full runner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orchestrator defaults, overridable per request
    pub orchestrator: OrchestratorConfig,
    /// Defaults for built-in processors
    pub nodes: NodesConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `flowdrop.json` in the
    /// working directory is used when present, otherwise defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    log::debug!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let contents = fs::read_to_string(&config_path)
            .await
            .map_err(|source| ConfigError::Io {
                path: config_path.clone(),
                source,
            })?;
        let config = Self::parse(&contents)?;

        log::info!("Configuration loaded from {:?}", config_path);
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(ConfigError::Parse)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdrop_engine::MissingDependencyPolicy;

    #[test]
    fn test_partial_config() {
        let config = AppConfig::parse(
            r#"{"orchestrator": {"missing_dependency_policy": "skip"}, "nodes": {"http": {"timeout_secs": 5}}}"#,
        )
        .unwrap();
        assert_eq!(
            config.orchestrator.missing_dependency_policy,
            MissingDependencyPolicy::Skip
        );
        assert!(config.orchestrator.continue_on_error);
        assert_eq!(config.nodes.http.timeout_secs, 5);
        assert_eq!(config.nodes.http.connect_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            AppConfig::parse("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/flowdrop-config.json"))).await;
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
