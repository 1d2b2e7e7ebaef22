//! URL Fetch Processor

use std::sync::Arc;

use async_trait::async_trait;
use flowdrop_engine::{
    EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::{json, Map};

use super::{failure_output, HttpClient, HttpRequest};
use crate::config::HttpDefaults;
use crate::fields::{lookup_or_config, text_of};

/// Fetches a URL with GET and returns its body as text
///
/// `maxLength` in config truncates the content (in characters).
pub struct UrlFetchProcessor {
    client: Arc<dyn HttpClient>,
    defaults: HttpDefaults,
}

impl UrlFetchProcessor {
    pub const NODE_TYPE: &'static str = "url_fetch";
    pub const PORT_URL: &'static str = "url";
    pub const PORT_CONTENT: &'static str = "content";

    pub fn new(client: Arc<dyn HttpClient>, defaults: HttpDefaults) -> Self {
        Self { client, defaults }
    }
}

impl ProcessorDescriptor for UrlFetchProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Http,
            label: "URL Fetch".to_string(),
            description: "Downloads the content of a URL".to_string(),
            inputs: vec![PortMetadata::optional(Self::PORT_URL, "URL", PortDataType::String)],
            outputs: vec![
                PortMetadata::optional(Self::PORT_CONTENT, "Content", PortDataType::String),
                PortMetadata::optional("contentType", "Content type", PortDataType::String),
                PortMetadata::optional("status", "Status", PortDataType::Number),
            ],
            config: vec![
                PortMetadata::optional("url", "URL", PortDataType::String),
                PortMetadata::optional("maxLength", "Max length", PortDataType::Number),
                PortMetadata::optional("timeout", "Timeout (s)", PortDataType::Number),
                PortMetadata::optional("connectTimeout", "Connect timeout (s)", PortDataType::Number),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for UrlFetchProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let url = lookup_or_config(inputs, config, Self::PORT_URL)
            .map(text_of)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| EngineError::MissingInput(Self::PORT_URL.to_string()))?;

        let request =
            HttpRequest::new("GET", url.as_str(), &self.defaults).with_node_timeouts(Self::NODE_TYPE, config)?;

        let out = match self.client.send(request).await {
            Ok(response) => {
                let mut content = response.body.clone();
                let mut truncated = false;
                if let Some(max) = config.get_f64("maxLength").filter(|m| *m >= 0.0) {
                    let max = max as usize;
                    if content.chars().count() > max {
                        content = content.chars().take(max).collect();
                        truncated = true;
                    }
                }
                log::debug!(
                    "UrlFetchProcessor: fetched {} ({} chars, status {})",
                    url,
                    content.len(),
                    response.status
                );

                let mut out = Map::new();
                out.insert("success".to_string(), json!(response.is_success()));
                out.insert("url".to_string(), json!(url));
                out.insert("status".to_string(), json!(response.status));
                out.insert("contentType".to_string(), json!(response.content_type()));
                out.insert(Self::PORT_CONTENT.to_string(), json!(content));
                out.insert("truncated".to_string(), json!(truncated));
                if !response.is_success() {
                    out.insert("error".to_string(), json!(format!("HTTP {}", response.status)));
                }
                out
            }
            Err(e) => {
                log::warn!("UrlFetchProcessor: fetching {} failed: {}", url, e);
                failure_output(&url, &e)
            }
        };

        Ok(NodeOutput::new(out))
    }
}
