//! Defaults shared by built-in processors

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration handed to [`register_builtins`](crate::register_builtins)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodesConfig {
    pub http: HttpDefaults,
    pub chat_model: ChatModelDefaults,
}

/// Defaults for HTTP processors, overridable per node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpDefaults {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("FlowDrop/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpDefaults {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Defaults for the chat model processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatModelDefaults {
    pub model: String,
    pub temperature: f64,
}

impl Default for ChatModelDefaults {
    fn default() -> Self {
        Self {
            model: "flowdrop-echo".to_string(),
            temperature: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: NodesConfig =
            serde_json::from_str(r#"{"http": {"timeout_secs": 5}}"#).unwrap();
        assert_eq!(config.http.timeout(), Duration::from_secs(5));
        assert_eq!(config.http.connect_timeout(), Duration::from_secs(10));
        assert!(config.http.user_agent.starts_with("FlowDrop/"));
        assert_eq!(config.chat_model.model, "flowdrop-echo");
    }
}
