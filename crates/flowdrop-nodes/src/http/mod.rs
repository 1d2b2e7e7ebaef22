//! HTTP nodes
//!
//! All HTTP processors talk through the [`HttpClient`] trait so tests can
//! substitute [`MockHttpClient`] for the reqwest-backed client. Transport
//! failures never fail the node; they are reported in the output as
//! `{success: false, error}`.

mod client;
mod http_request;
mod mock;
mod url_fetch;
mod webhook;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use flowdrop_engine::{EngineError, NodeConfig};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::config::HttpDefaults;

pub use client::ReqwestHttpClient;
pub use http_request::HttpRequestProcessor;
pub use mock::MockHttpClient;
pub use url_fetch::UrlFetchProcessor;
pub use webhook::WebhookProcessor;

/// Errors raised by an [`HttpClient`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Json(Value),
    Text(String),
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<HttpBody>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>, defaults: &HttpDefaults) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout: defaults.timeout(),
            connect_timeout: defaults.connect_timeout(),
        }
    }

    /// Apply `timeout` and `connectTimeout` (seconds) from a node config.
    ///
    /// Values too large for a `Duration` are rejected as invalid config.
    pub fn with_node_timeouts(mut self, node_type: &str, config: &NodeConfig) -> flowdrop_engine::Result<Self> {
        if let Some(timeout) = config_duration(node_type, config, "timeout")? {
            self.timeout = timeout;
        }
        if let Some(timeout) = config_duration(node_type, config, "connectTimeout")? {
            self.connect_timeout = timeout;
        }
        Ok(self)
    }

    /// Merge string-valued headers from a JSON object
    pub fn with_headers(mut self, headers: Option<&Value>) -> Self {
        if let Some(Value::Object(map)) = headers {
            for (name, value) in map {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => continue,
                    other => other.to_string(),
                };
                self.headers.insert(name.clone(), value);
            }
        }
        self
    }

    pub fn with_body(mut self, body: Option<HttpBody>) -> Self {
        self.body = body;
        self
    }
}

fn config_duration(node_type: &str, config: &NodeConfig, key: &str) -> flowdrop_engine::Result<Option<Duration>> {
    let Some(secs) = config.get_f64(key).filter(|s| *s > 0.0) else {
        return Ok(None);
    };
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|e| EngineError::invalid_config(node_type, format!("{} {}: {}", key, secs, e)))
}

/// A received response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Raw body text
    pub body: String,
    /// Body parsed as JSON, when it is JSON
    pub json: Option<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            headers: BTreeMap::new(),
            json: serde_json::from_str(&body).ok(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// Transport used by HTTP processors
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Output for a request that never produced a response
pub(crate) fn failure_output(url: &str, error: &HttpError) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("success".to_string(), json!(false));
    out.insert("url".to_string(), json!(url));
    out.insert("status".to_string(), json!(0));
    out.insert("error".to_string(), json!(error.to_string()));
    out
}

/// Body from a JSON value: strings are sent as text, everything else as JSON
pub(crate) fn body_from(value: Option<&Value>) -> Option<HttpBody> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(HttpBody::Text(s.clone())),
        other => Some(HttpBody::Json(other.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_timeouts_override_defaults() {
        let defaults = HttpDefaults::default();
        let config = NodeConfig::from_value(&json!({"timeout": 2, "connectTimeout": 0.5}));
        let request = HttpRequest::new("GET", "http://example.test", &defaults)
            .with_node_timeouts("http_request", &config)
            .unwrap();
        assert_eq!(request.timeout, Duration::from_secs(2));
        assert_eq!(request.connect_timeout, Duration::from_millis(500));

        let untouched = HttpRequest::new("GET", "http://example.test", &defaults)
            .with_node_timeouts("http_request", &NodeConfig::default())
            .unwrap();
        assert_eq!(untouched.timeout, Duration::from_secs(30));
        assert_eq!(untouched.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_out_of_range_timeouts_are_invalid_config() {
        for config in [json!({"timeout": 1e30}), json!({"connectTimeout": "inf"})] {
            let result = HttpRequest::new("GET", "http://example.test", &HttpDefaults::default())
                .with_node_timeouts("http_request", &NodeConfig::from_value(&config));
            assert!(matches!(result, Err(EngineError::InvalidConfig { .. })), "{}", config);
        }
    }

    #[test]
    fn test_headers_are_stringified() {
        let request = HttpRequest::new("GET", "http://example.test", &HttpDefaults::default())
            .with_headers(Some(&json!({"X-Count": 3, "Accept": "text/plain", "Skip": null})));
        assert_eq!(request.headers["X-Count"], "3");
        assert_eq!(request.headers["Accept"], "text/plain");
        assert!(!request.headers.contains_key("Skip"));
    }

    #[test]
    fn test_response_parses_json_best_effort() {
        assert_eq!(HttpResponse::new(200, r#"{"a":1}"#).json, Some(json!({"a": 1})));
        assert!(HttpResponse::new(200, "plain").json.is_none());
        assert!(!HttpResponse::new(404, "").is_success());
    }
}
