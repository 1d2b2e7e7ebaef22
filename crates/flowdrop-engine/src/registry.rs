//! Processor registry for node type resolution
//!
//! Maps node type strings to processor factories and metadata. Hosts
//! register every processor explicitly at startup; there is no
//! attribute scanning or link-time collection.
//!
//! # Usage
//!
//! ```ignore
//! use flowdrop_engine::ProcessorRegistry;
//!
//! let mut registry = ProcessorRegistry::new();
//! registry.register_shared(Arc::new(MyProcessor::default()));
//! let processor = registry.get_processor("my_processor");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::descriptor::{NodeCategory, ProcessorMetadata};
use crate::error::Result;
use crate::processor::{NodeConfig, NodeInput, NodeOutput, NodeProcessor};

/// Factory for creating or returning a shared processor
pub trait ProcessorFactory: Send + Sync {
    fn create_processor(&self) -> Arc<dyn NodeProcessor>;
}

/// A registration entry combining metadata with an optional factory
struct RegistryEntry {
    metadata: ProcessorMetadata,
    factory: Option<Arc<dyn ProcessorFactory>>,
}

/// Registry of node types with their metadata and processors
///
/// # Composability
///
/// Registries can be composed by merging:
/// ```ignore
/// let mut registry = ProcessorRegistry::new();
/// flowdrop_nodes::register_builtins(&mut registry, &config);
/// registry.merge(plugin_registry);
/// ```
pub struct ProcessorRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl ProcessorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a node type with metadata and a processor factory
    pub fn register(&mut self, metadata: ProcessorMetadata, factory: Arc<dyn ProcessorFactory>) {
        if self.entries.contains_key(&metadata.node_type) {
            log::debug!("Replacing processor registration for '{}'", metadata.node_type);
        }
        self.entries.insert(
            metadata.node_type.clone(),
            RegistryEntry {
                metadata,
                factory: Some(factory),
            },
        );
    }

    /// Register a single shared processor instance under its own node type
    pub fn register_shared(&mut self, processor: Arc<dyn NodeProcessor>) {
        let metadata = processor.metadata();
        self.register(metadata, Arc::new(SharedProcessorFactory { processor }));
    }

    /// Register a node type backed by a synchronous closure
    ///
    /// Useful for tests and embedding hosts that do not need a full
    /// processor type. The closure receives the resolved inputs and config.
    pub fn register_fn<F>(&mut self, metadata: ProcessorMetadata, callback: F)
    where
        F: Fn(&NodeInput, &NodeConfig) -> Result<Map<String, Value>> + Send + Sync + 'static,
    {
        let processor = Arc::new(FnProcessor {
            metadata: metadata.clone(),
            callback: Box::new(callback),
        });
        self.register(metadata, Arc::new(SharedProcessorFactory { processor }));
    }

    /// Register a node type with metadata only (no processor)
    ///
    /// Used for palette listings and validation.
    pub fn register_metadata(&mut self, metadata: ProcessorMetadata) {
        self.entries.insert(
            metadata.node_type.clone(),
            RegistryEntry {
                metadata,
                factory: None,
            },
        );
    }

    /// Get metadata for a node type
    pub fn get_metadata(&self, node_type: &str) -> Option<&ProcessorMetadata> {
        self.entries.get(node_type).map(|e| &e.metadata)
    }

    /// Get all registered metadata, sorted by node type
    pub fn all_metadata(&self) -> Vec<&ProcessorMetadata> {
        let mut all: Vec<&ProcessorMetadata> = self.entries.values().map(|e| &e.metadata).collect();
        all.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        all
    }

    /// Get metadata grouped by category
    pub fn metadata_by_category(&self) -> HashMap<NodeCategory, Vec<&ProcessorMetadata>> {
        let mut grouped: HashMap<NodeCategory, Vec<&ProcessorMetadata>> = HashMap::new();
        for entry in self.entries.values() {
            grouped
                .entry(entry.metadata.category)
                .or_default()
                .push(&entry.metadata);
        }
        grouped
    }

    /// Get the processor for a node type
    pub fn get_processor(&self, node_type: &str) -> Option<Arc<dyn NodeProcessor>> {
        self.entries
            .get(node_type)
            .and_then(|e| e.factory.as_ref())
            .map(|f| f.create_processor())
    }

    /// Check if a node type is registered
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// List all registered node type strings
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Merge another registry into this one
    ///
    /// Entries from `other` override entries in `self` if they share the same node_type.
    pub fn merge(&mut self, other: ProcessorRegistry) {
        self.entries.extend(other.entries);
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory that returns a shared processor instance
struct SharedProcessorFactory {
    processor: Arc<dyn NodeProcessor>,
}

impl ProcessorFactory for SharedProcessorFactory {
    fn create_processor(&self) -> Arc<dyn NodeProcessor> {
        self.processor.clone()
    }
}

type ProcessFn = dyn Fn(&NodeInput, &NodeConfig) -> Result<Map<String, Value>> + Send + Sync;

/// Closure-backed processor
struct FnProcessor {
    metadata: ProcessorMetadata,
    callback: Box<ProcessFn>,
}

#[async_trait]
impl NodeProcessor for FnProcessor {
    fn metadata(&self) -> ProcessorMetadata {
        self.metadata.clone()
    }

    async fn process(&self, inputs: &NodeInput, config: &NodeConfig) -> Result<NodeOutput> {
        (self.callback)(inputs, config).map(NodeOutput::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{PortDataType, PortMetadata};
    use crate::error::EngineError;

    fn test_metadata(node_type: &str) -> ProcessorMetadata {
        ProcessorMetadata {
            node_type: node_type.to_string(),
            category: NodeCategory::Processing,
            label: format!("Test {}", node_type),
            description: "Test node".to_string(),
            inputs: vec![PortMetadata::optional("input", "Input", PortDataType::String)],
            outputs: vec![PortMetadata::optional("output", "Output", PortDataType::String)],
            config: vec![],
        }
    }

    #[test]
    fn test_register_and_lookup_metadata() {
        let mut registry = ProcessorRegistry::new();
        registry.register_metadata(test_metadata("test_node"));

        assert!(registry.has_node_type("test_node"));
        assert!(!registry.has_node_type("unknown"));

        let meta = registry.get_metadata("test_node").unwrap();
        assert_eq!(meta.label, "Test test_node");
    }

    #[test]
    fn test_merge_override() {
        let mut registry1 = ProcessorRegistry::new();
        let mut meta1 = test_metadata("node_a");
        meta1.label = "Original".to_string();
        registry1.register_metadata(meta1);

        let mut registry2 = ProcessorRegistry::new();
        let mut meta2 = test_metadata("node_a");
        meta2.label = "Override".to_string();
        registry2.register_metadata(meta2);
        registry2.register_metadata(test_metadata("node_b"));

        registry1.merge(registry2);
        assert_eq!(registry1.node_types(), vec!["node_a", "node_b"]);
        assert_eq!(registry1.get_metadata("node_a").unwrap().label, "Override");
    }

    #[test]
    fn test_no_processor_for_metadata_only() {
        let mut registry = ProcessorRegistry::new();
        registry.register_metadata(test_metadata("metadata_only"));

        assert!(registry.has_node_type("metadata_only"));
        assert!(registry.get_processor("metadata_only").is_none());
    }

    #[tokio::test]
    async fn test_register_fn() {
        let mut registry = ProcessorRegistry::new();
        registry.register_fn(test_metadata("echo"), |inputs, _config| {
            Ok(inputs.values().clone())
        });

        let processor = registry.get_processor("echo").unwrap();
        let inputs: NodeInput = [("input".to_string(), serde_json::json!("hello"))]
            .into_iter()
            .collect();
        let output = processor
            .process(&inputs, &NodeConfig::default())
            .await
            .unwrap();
        assert_eq!(output.get("input").unwrap(), "hello");
        assert!(output.control.is_none());
    }

    #[tokio::test]
    async fn test_register_fn_error_propagates() {
        let mut registry = ProcessorRegistry::new();
        registry.register_fn(test_metadata("broken"), |_inputs, _config| {
            Err(EngineError::failed("boom"))
        });

        let processor = registry.get_processor("broken").unwrap();
        let result = processor
            .process(&NodeInput::default(), &NodeConfig::default())
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_by_category() {
        let mut registry = ProcessorRegistry::new();

        let mut meta_input = test_metadata("text_input");
        meta_input.category = NodeCategory::Input;
        registry.register_metadata(meta_input);
        registry.register_metadata(test_metadata("calculator"));

        let grouped = registry.metadata_by_category();
        assert_eq!(grouped.get(&NodeCategory::Input).unwrap().len(), 1);
        assert_eq!(grouped.get(&NodeCategory::Processing).unwrap().len(), 1);
    }
}
