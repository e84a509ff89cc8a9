//! Static catalogue of selectable models and their provider routing.

use crate::config::Config;
use crate::providers::{MOCK_PROVIDER, OPENAI_COMPAT_PROVIDER};

use serde::Serialize;
use tracing::debug;

/// Model id used when a request names a model that is not listed.
pub const MOCK_MODEL_ID: &str = "mock-1";

/// Models served by the pass-through, listed when it is configured.
const OPENAI_COMPAT_MODELS: &[(&str, &str)] = &[
    ("gpt-4o", "GPT-4o"),
    ("gpt-5", "GPT-5"),
    ("deepseek-chat", "DeepSeek Chat"),
    ("qwen-max", "Qwen Max"),
];

/// An entry of the model picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "provider")]
    pub provider_key: String,
    pub description: Option<String>,
}

impl ModelItem {
    pub fn new(id: &str, name: &str, provider_key: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider_key: provider_key.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// The routing decision for one request. Serializes as the `meta` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModel {
    pub model: String,
    pub provider: String,
}

/// Ordered, immutable list of models.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    items: Vec<ModelItem>,
}

impl ModelRegistry {
    /// The built-in catalogue. Pass-through models are only listed when
    /// `openai_compat_enabled`.
    pub fn new(openai_compat_enabled: bool) -> Self {
        let mut items = vec![ModelItem::new(MOCK_MODEL_ID, "Mock Stream", MOCK_PROVIDER)
            .with_description("Local simulated streaming output")];

        if openai_compat_enabled {
            items.extend(
                OPENAI_COMPAT_MODELS
                    .iter()
                    .map(|(id, name)| ModelItem::new(id, name, OPENAI_COMPAT_PROVIDER)),
            );
        }

        Self { items }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.openai_compat_enabled())
    }

    /// A registry with exactly `items`, in order.
    pub fn from_items(items: Vec<ModelItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ModelItem] {
        &self.items
    }

    /// First entry whose id equals `id`.
    pub fn find(&self, id: &str) -> Option<&ModelItem> {
        self.items.iter().find(|m| m.id == id)
    }

    /// Route `requested` to a provider, falling back to the mock model for
    /// anything not listed.
    pub fn resolve(&self, requested: &str) -> ResolvedModel {
        match self.find(requested) {
            Some(item) => ResolvedModel {
                model: item.id.clone(),
                provider: item.provider_key.clone(),
            },
            None => {
                debug!(requested, "unknown model, routing to mock");
                ResolvedModel {
                    model: MOCK_MODEL_ID.to_string(),
                    provider: MOCK_PROVIDER.to_string(),
                }
            }
        }
    }
}
