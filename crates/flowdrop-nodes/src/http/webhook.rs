//! Webhook Processor
//!
//! Posts a JSON event envelope to a configured endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use flowdrop_engine::{
    EngineError, NodeCategory, NodeConfig, NodeInput, NodeOutput, NodeProcessor, PortDataType,
    PortMetadata, ProcessorDescriptor, ProcessorMetadata,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{failure_output, HttpBody, HttpClient, HttpRequest};
use crate::config::HttpDefaults;
use crate::fields::{lookup, text_of};

/// Webhook Processor
///
/// Sends `{id, event, timestamp, data}` where `data` is the `data` input
/// (or every input when `data` is not connected).
pub struct WebhookProcessor {
    client: Arc<dyn HttpClient>,
    defaults: HttpDefaults,
}

impl WebhookProcessor {
    pub const NODE_TYPE: &'static str = "webhook";
    pub const PORT_DATA: &'static str = "data";
    pub const DEFAULT_EVENT: &'static str = "workflow.node";

    pub fn new(client: Arc<dyn HttpClient>, defaults: HttpDefaults) -> Self {
        Self { client, defaults }
    }
}

impl ProcessorDescriptor for WebhookProcessor {
    fn descriptor() -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: Self::NODE_TYPE.to_string(),
            category: NodeCategory::Http,
            label: "Webhook".to_string(),
            description: "Posts workflow data to a webhook endpoint".to_string(),
            inputs: vec![PortMetadata::optional(Self::PORT_DATA, "Data", PortDataType::Any)],
            outputs: vec![
                PortMetadata::optional("success", "Delivered", PortDataType::Boolean),
                PortMetadata::optional("status", "Status", PortDataType::Number),
                PortMetadata::optional("deliveryId", "Delivery ID", PortDataType::String),
            ],
            config: vec![
                PortMetadata::required("url", "Webhook URL", PortDataType::String),
                PortMetadata::optional("event", "Event name", PortDataType::String)
                    .with_default(json!(Self::DEFAULT_EVENT)),
                PortMetadata::optional("headers", "Headers", PortDataType::Json),
                PortMetadata::optional("timeout", "Timeout (s)", PortDataType::Number),
                PortMetadata::optional("connectTimeout", "Connect timeout (s)", PortDataType::Number),
            ],
        }
    }
}

#[async_trait]
impl NodeProcessor for WebhookProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        Self::descriptor()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> flowdrop_engine::Result<NodeOutput> {
        let url = config
            .get("url")
            .map(text_of)
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| EngineError::MissingInput("url".to_string()))?;

        let delivery_id = Uuid::new_v4().to_string();
        let event = config.get_str_or("event", Self::DEFAULT_EVENT);
        let data = lookup(inputs, Self::PORT_DATA)
            .cloned()
            .unwrap_or_else(|| Value::Object(inputs.values().clone()));
        let envelope = json!({
            "id": delivery_id,
            "event": event,
            "timestamp": Utc::now().to_rfc3339(),
            "data": data,
        });

        let request = HttpRequest::new("POST", url.as_str(), &self.defaults)
            .with_node_timeouts(Self::NODE_TYPE, config)?
            .with_headers(config.get("headers"))
            .with_body(Some(HttpBody::Json(envelope)));

        let mut out = match self.client.send(request).await {
            Ok(response) => {
                log::debug!("WebhookProcessor: '{}' delivered to {} ({})", event, url, response.status);
                let mut out = serde_json::Map::new();
                out.insert("success".to_string(), json!(response.is_success()));
                out.insert("url".to_string(), json!(url));
                out.insert("status".to_string(), json!(response.status));
                out.insert(
                    "response".to_string(),
                    response.json.unwrap_or(Value::String(response.body)),
                );
                if !(200..300).contains(&response.status) {
                    out.insert("error".to_string(), json!(format!("HTTP {}", response.status)));
                }
                out
            }
            Err(e) => {
                log::warn!("WebhookProcessor: delivery to {} failed: {}", url, e);
                failure_output(&url, &e)
            }
        };
        out.insert("deliveryId".to_string(), json!(delivery_id));

        Ok(NodeOutput::new(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, MockHttpClient};

    #[tokio::test]
    async fn test_posts_envelope() {
        let client = Arc::new(MockHttpClient::new().with_response(202, r#"{"queued":true}"#));
        let processor = WebhookProcessor::new(client.clone(), HttpDefaults::default());
        let inputs: NodeInput = [("data".to_string(), json!({"user": "ada"}))]
            .into_iter()
            .collect();

        let output = processor
            .process(
                &inputs,
                &NodeConfig::from_value(&json!({"url": "http://hooks.test/in", "event": "user.created"})),
            )
            .await
            .unwrap();

        assert_eq!(output.get("success"), Some(&json!(true)));
        assert_eq!(output.get("response"), Some(&json!({"queued": true})));

        let sent = &client.requests()[0];
        assert_eq!(sent.method, "POST");
        match &sent.body {
            Some(HttpBody::Json(body)) => {
                assert_eq!(body["event"], json!("user.created"));
                assert_eq!(body["data"], json!({"user": "ada"}));
                assert_eq!(body["id"], *output.get("deliveryId").unwrap());
            }
            other => panic!("expected JSON body, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let client = Arc::new(
            MockHttpClient::new().with_error(HttpError::Connect("refused".to_string())),
        );
        let processor = WebhookProcessor::new(client, HttpDefaults::default());

        let output = processor
            .process(
                &NodeInput::default(),
                &NodeConfig::from_value(&json!({"url": "http://hooks.test/in"})),
            )
            .await
            .unwrap();
        assert_eq!(output.get("success"), Some(&json!(false)));
        assert!(output.get("deliveryId").is_some());
    }
}
