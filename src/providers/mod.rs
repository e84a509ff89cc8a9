mod mock;
pub(crate) mod openai_compat;

pub use mock::{mock_reply, MockProvider};
pub use openai_compat::OpenAiCompatProvider;

use crate::config::Config;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Provider key of the local mock generator.
pub const MOCK_PROVIDER: &str = "mock";

/// Provider key of the OpenAI-compatible pass-through.
pub const OPENAI_COMPAT_PROVIDER: &str = "openai_compat";

/// Capacity of the channel between a provider task and its consumer.
pub(crate) const STREAM_BUFFER: usize = 256;

// ============================================================================
// Provider Types
// ============================================================================

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Events streamed from a provider.
///
/// A well-behaved provider sends any number of `Delta`s followed by exactly
/// one `Done` or `Error`, then closes the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// Failures a provider can report. The `Display` text is what clients see.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Upstream error ({status}): {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to read upstream stream: {0}")]
    Stream(#[source] reqwest::Error),

    #[error("Upstream idle for more than {0:?}")]
    Timeout(std::time::Duration),

    #[error("Provider not available: {0}")]
    Unavailable(String),
}

// ============================================================================
// Provider Trait
// ============================================================================

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Start a streamed completion for `model` over `messages`.
    ///
    /// Returns once the provider has committed to producing output; text
    /// then arrives on the receiver. Dropping the receiver cancels the
    /// generation.
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> std::result::Result<mpsc::Receiver<StreamEvent>, ProviderError>;

    fn name(&self) -> &str;
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Provider instances keyed by provider key. Read-only once built.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry for a loaded configuration.
    ///
    /// The mock provider is always present. The pass-through is only
    /// registered when its configuration exists.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(
            MOCK_PROVIDER,
            Arc::new(MockProvider::with_delay(config.mock.char_delay)),
        );

        if let Some(compat) = &config.openai_compat {
            registry.register(
                OPENAI_COMPAT_PROVIDER,
                Arc::new(OpenAiCompatProvider::new(compat)?),
            );
        }

        Ok(registry)
    }

    pub fn register(&mut self, key: impl Into<String>, provider: Arc<dyn ModelProvider>) {
        self.providers.insert(key.into(), provider);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("providers", &keys)
            .finish()
    }
}
