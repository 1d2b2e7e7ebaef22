//! HTTP Request Processor
//!
//! Sends an arbitrary HTTP request built from config and inputs.

use std::sync::Arc;

use async_trait::async_trait;
use flowdrop_engine::{
    EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::{json, Map, Value};

use super::{body_from, failure_output, HttpClient, HttpRequest};
use crate::config::HttpDefaults;
use crate::fields::{lookup, lookup_or_config, text_of};

/// HTTP Request Processor
///
/// # Inputs
/// - `url` (optional) - Overrides the configured URL
/// - `body` (optional) - Overrides the configured body
/// - `headers` (optional) - Merged over the configured headers
///
/// # Outputs
/// - `success`, `status`, `headers`, `body`, `json`, and `error` on failure
pub struct HttpRequestProcessor {
    client: Arc<dyn HttpClient>,
    defaults: HttpDefaults,
}

impl HttpRequestProcessor {
    pub const NODE_TYPE: &'static str = "http_request";
    pub const PORT_URL: &'static str = "url";
    pub const PORT_BODY: &'static str = "body";
    pub const PORT_HEADERS: &'static str = "headers";
    pub const PORT_STATUS: &'static str = "status";
    pub const PORT_JSON: &'static str = "json";

    pub fn new(client: Arc<dyn HttpClient>, defaults: HttpDefaults) -> Self {
        Self { client, defaults }
    }
}

impl ProcessorDescriptor for HttpRequestProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Http,
            label: "HTTP Request".to_string(),
            description: "Sends an HTTP request and returns the response".to_string(),
            inputs: vec![
                PortMetadata::optional(Self::PORT_URL, "URL", PortDataType::String),
                PortMetadata::optional(Self::PORT_BODY, "Body", PortDataType::Any),
                PortMetadata::optional(Self::PORT_HEADERS, "Headers", PortDataType::Json),
            ],
            outputs: vec![
                PortMetadata::optional("success", "Success", PortDataType::Boolean),
                PortMetadata::optional(Self::PORT_STATUS, "Status", PortDataType::Number),
                PortMetadata::optional(Self::PORT_HEADERS, "Headers", PortDataType::Json),
                PortMetadata::optional(Self::PORT_BODY, "Body", PortDataType::String),
                PortMetadata::optional(Self::PORT_JSON, "JSON", PortDataType::Any),
            ],
            config: vec![
                PortMetadata::required("url", "URL", PortDataType::String),
                PortMetadata::optional("method", "Method", PortDataType::String)
                    .with_default(json!("GET"))
                    .with_options(&["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"]),
                PortMetadata::optional("headers", "Headers", PortDataType::Json),
                PortMetadata::optional("body", "Body", PortDataType::Any),
                PortMetadata::optional("timeout", "Timeout (s)", PortDataType::Number)
                    .with_default(json!(30)),
                PortMetadata::optional("connectTimeout", "Connect timeout (s)", PortDataType::Number)
                    .with_default(json!(10)),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for HttpRequestProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let url = lookup_or_config(inputs, config, Self::PORT_URL)
            .map(text_of)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| EngineError::MissingInput(Self::PORT_URL.to_string()))?;
        let method = config.get_str_or("method", "GET").to_ascii_uppercase();

        let request = HttpRequest::new(method.as_str(), url.as_str(), &self.defaults)
            .with_node_timeouts(Self::NODE_TYPE, config)?
            .with_headers(config.get("headers"))
            .with_headers(lookup(inputs, Self::PORT_HEADERS))
            .with_body(body_from(lookup_or_config(inputs, config, Self::PORT_BODY)));

        log::debug!("HttpRequestProcessor: {} {}", method, url);

        let out = match self.client.send(request).await {
            Ok(response) => {
                let mut out = Map::new();
                out.insert("success".to_string(), json!(response.is_success()));
                out.insert("url".to_string(), json!(url));
                out.insert(Self::PORT_STATUS.to_string(), json!(response.status));
                out.insert(Self::PORT_HEADERS.to_string(), json!(response.headers));
                out.insert(Self::PORT_BODY.to_string(), json!(response.body));
                out.insert(
                    Self::PORT_JSON.to_string(),
                    response.json.clone().unwrap_or(Value::Null),
                );
                if !response.is_success() {
                    out.insert("error".to_string(), json!(format!("HTTP {}", response.status)));
                }
                out
            }
            Err(e) => {
                log::warn!("HttpRequestProcessor: {} {} failed: {}", method, url, e);
                failure_output(&url, &e)
            }
        };

        Ok(NodeOutput::new(out))
    }
}
