//! Registry of named agent providers

use crate::{AgentProvider, Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps provider names (e.g., "anthropic", "openai") to provider instances
///
/// Callers build the registry and hand it to the service that needs it;
/// there is no process-wide provider state.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn AgentProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any provider with the same name
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn AgentProvider>) {
        let name = name.into();
        if self.providers.insert(name.clone(), provider).is_some() {
            tracing::debug!("Replaced agent provider '{}'", name);
        }
    }

    /// Builder-style registration
    pub fn with_provider(mut self, name: impl Into<String>, provider: Arc<dyn AgentProvider>) -> Self {
        self.register(name, provider);
        self
    }

    /// Resolve a provider by name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn AgentProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProvider {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Names of all registered providers, sorted
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Get the number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderError, TaskOutput, TaskRequest};
    use async_trait::async_trait;

    struct EchoProvider;

    #[async_trait]
    impl AgentProvider for EchoProvider {
        async fn run_task(&self, request: TaskRequest) -> std::result::Result<TaskOutput, ProviderError> {
            Ok(TaskOutput::Text(request.prompt))
        }
    }

    #[test]
    fn test_resolve_known_provider() {
        let registry = ProviderRegistry::new().with_provider("echo", Arc::new(EchoProvider));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("echo").is_ok());
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let registry = ProviderRegistry::new()
            .with_provider("openai", Arc::new(EchoProvider))
            .with_provider("anthropic", Arc::new(EchoProvider));

        let err = registry.resolve("ollama").err().unwrap();
        assert_eq!(
            err.to_string(),
            "Unknown agent provider 'ollama' (available: anthropic, openai)"
        );
    }

    #[tokio::test]
    async fn test_resolved_provider_runs() {
        let registry = ProviderRegistry::new().with_provider("echo", Arc::new(EchoProvider));
        let provider = registry.resolve("echo").unwrap();

        let output = provider
            .run_task(TaskRequest {
                role: "market_analysis".to_string(),
                prompt: "hello".to_string(),
                tools: Vec::new(),
                result_shape: crate::ResultShape::Untyped,
                model: None,
                instructions: None,
            })
            .await;

        tokio_test::assert_ok!(&output);
        assert_eq!(output.unwrap(), TaskOutput::Text("hello".to_string()));
    }
}
