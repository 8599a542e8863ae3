use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{AnthropicAdapter, ChatCompletionsAdapter, DynProvider, ProviderAdapter};

// ---------------------------------------------------------------------------
// ProviderDescriptor
// ---------------------------------------------------------------------------

/// How a provider expects its request body and reply to be shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestShape {
    /// Flat `messages` array, bearer auth, reply in `choices[0].message.content`.
    ChatCompletions,
    /// Multi-part `content` array, `x-api-key` auth, reply in `content[0].text`.
    ContentArray,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub endpoint: String,
    pub model: String,
    pub shape: RequestShape,
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        shape: RequestShape,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            shape,
        }
    }

    /// Instantiate the adapter matching this descriptor's shape.
    pub fn into_provider(self) -> DynProvider {
        match self.shape {
            RequestShape::ChatCompletions => DynProvider::new(ChatCompletionsAdapter::new(self)),
            RequestShape::ContentArray => DynProvider::new(AnthropicAdapter::new(self)),
        }
    }
}

/// The built-in providers, in selection order. The first is the default.
pub fn builtin_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::new(
            "DeepSeek",
            "https://api.deepseek.com/chat/completions",
            "deepseek-chat",
            RequestShape::ChatCompletions,
        ),
        ProviderDescriptor::new(
            "Gemini",
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
            "gemini-exp-1121",
            RequestShape::ChatCompletions,
        ),
        ProviderDescriptor::new(
            "OpenAI",
            "https://api.openai.com/v1/chat/completions",
            "gpt-4o-2024-05-13",
            RequestShape::ChatCompletions,
        ),
        ProviderDescriptor::new(
            "Claude",
            "https://api.anthropic.com/v1/messages",
            "claude-3-5-sonnet-20241022",
            RequestShape::ContentArray,
        ),
        ProviderDescriptor::new(
            "XAI",
            "https://api.x.ai/v1/chat/completions",
            "grok-beta",
            RequestShape::ChatCompletions,
        ),
    ]
}

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// Name-keyed provider lookup that remembers registration order.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    order: Vec<String>,
    providers: HashMap<String, DynProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in provider.
    pub fn builtin() -> Self {
        Self::from_descriptors(builtin_descriptors())
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ProviderDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.insert(descriptor.into_provider());
        }
        registry
    }

    pub fn register(&mut self, provider: impl ProviderAdapter + 'static) {
        self.insert(DynProvider::new(provider));
    }

    /// Re-registering a name replaces the adapter but keeps its original position.
    pub fn insert(&mut self, provider: DynProvider) {
        let name = provider.name().to_string();
        if !self.providers.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.providers.insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<&DynProvider> {
        self.providers.get(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.get(name).map(DynProvider::descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Provider names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.providers.get(name))
            .map(DynProvider::descriptor)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_order_and_default() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["DeepSeek", "Gemini", "OpenAI", "Claude", "XAI"]
        );
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn only_claude_uses_content_array() {
        let registry = ProviderRegistry::builtin();
        for descriptor in registry.descriptors() {
            let expected = if descriptor.name == "Claude" {
                RequestShape::ContentArray
            } else {
                RequestShape::ChatCompletions
            };
            assert_eq!(descriptor.shape, expected, "{}", descriptor.name);
        }
    }

    #[test]
    fn lookup_unknown_returns_none() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.get("Mystery").is_none());
        assert!(registry.descriptor("").is_none());
        assert!(!registry.contains("mystery"));
    }

    #[test]
    fn descriptor_builds_matching_adapter() {
        let provider = ProviderDescriptor::new(
            "Local",
            "http://localhost:1234/v1/messages",
            "local-model",
            RequestShape::ContentArray,
        )
        .into_provider();
        assert!(provider.supports_attachments());
        assert_eq!(provider.model(), "local-model");
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut registry = ProviderRegistry::builtin();
        registry.insert(
            ProviderDescriptor::new(
                "DeepSeek",
                "http://127.0.0.1:9/chat/completions",
                "deepseek-reasoner",
                RequestShape::ChatCompletions,
            )
            .into_provider(),
        );
        assert_eq!(registry.names()[0], "DeepSeek");
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.descriptor("DeepSeek").unwrap().model, "deepseek-reasoner");
    }

    #[test]
    fn register_adds_custom_adapter_after_builtins() {
        let mut registry = ProviderRegistry::builtin();
        registry.register(
            AnthropicAdapter::new(ProviderDescriptor::new(
                "Proxy",
                "http://127.0.0.1:8080/v1/messages",
                "claude-proxy",
                RequestShape::ContentArray,
            ))
            .with_max_tokens(256),
        );

        assert!(registry.contains("Proxy"));
        assert_eq!(registry.names().last(), Some(&"Proxy"));
        assert_eq!(registry.len(), 6);
        let req = registry.get("Proxy").unwrap().build_request("hi", &[], "k");
        assert_eq!(req.body["max_tokens"], 256);
    }

    #[test]
    fn empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }
}
