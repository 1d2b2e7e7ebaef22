//! Built-in processor registration
//!
//! Hosts call [`register_builtins`] at startup. Registration is explicit:
//! every built-in node type is listed here.

use std::sync::Arc;

use flowdrop_engine::ProcessorRegistry;

use crate::ai::ChatModelProcessor;
use crate::config::NodesConfig;
use crate::control::{BooleanGatewayProcessor, ConditionalProcessor, GatewayProcessor, IfElseProcessor};
use crate::http::{
    HttpClient, HttpRequestProcessor, ReqwestHttpClient, UrlFetchProcessor, WebhookProcessor,
};
use crate::input::{ManualTriggerProcessor, TextInputProcessor};
use crate::output::TextOutputProcessor;
use crate::processing::{
    CalculatorProcessor, ConcatTextsProcessor, RegexExtractorProcessor, TextTransformProcessor,
};

/// Register every built-in processor, using reqwest for HTTP nodes
///
/// # Example
///
/// ```ignore
/// let mut registry = ProcessorRegistry::new();
/// flowdrop_nodes::register_builtins(&mut registry, &NodesConfig::default());
/// let orchestrator = SynchronousOrchestrator::new(Arc::new(registry));
/// ```
pub fn register_builtins(registry: &mut ProcessorRegistry, config: &NodesConfig) {
    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(config.http.user_agent.clone()));
    register_builtins_with_client(registry, config, client);
}

/// Register every built-in processor with a caller-supplied HTTP client
pub fn register_builtins_with_client(
    registry: &mut ProcessorRegistry,
    config: &NodesConfig,
    client: Arc<dyn HttpClient>,
) {
    registry.register_shared(Arc::new(TextInputProcessor));
    registry.register_shared(Arc::new(ManualTriggerProcessor));
    registry.register_shared(Arc::new(TextOutputProcessor));

    registry.register_shared(Arc::new(TextTransformProcessor));
    registry.register_shared(Arc::new(ConcatTextsProcessor));
    registry.register_shared(Arc::new(RegexExtractorProcessor));
    registry.register_shared(Arc::new(CalculatorProcessor));

    registry.register_shared(Arc::new(BooleanGatewayProcessor));
    registry.register_shared(Arc::new(GatewayProcessor));
    registry.register_shared(Arc::new(IfElseProcessor));
    registry.register_shared(Arc::new(ConditionalProcessor));

    registry.register_shared(Arc::new(HttpRequestProcessor::new(
        client.clone(),
        config.http.clone(),
    )));
    registry.register_shared(Arc::new(WebhookProcessor::new(
        client.clone(),
        config.http.clone(),
    )));
    registry.register_shared(Arc::new(UrlFetchProcessor::new(client, config.http.clone())));

    registry.register_shared(Arc::new(ChatModelProcessor::new(config.chat_model.clone())));

    log::debug!("Registered {} built-in processors", registry.node_types().len());
}

/// A registry holding only the built-in processors
pub fn builtin_registry(config: &NodesConfig) -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    register_builtins(&mut registry, config);
    registry
}
