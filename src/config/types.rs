use super::defaults::*;

use serde::Serialize;
use std::time::Duration;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
        }
    }
}

/// Settings of the OpenAI-compatible pass-through. Only exists when both
/// the base URL and the API key were provided.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenAiCompatConfig {
    pub base_url: String,
    pub api_key: String,
    /// Longest wait for upstream headers or the next body chunk.
    /// `None` waits indefinitely.
    pub idle_timeout: Option<Duration>,
}

impl std::fmt::Debug for OpenAiCompatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    pub char_delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(DEFAULT_MOCK_CHAR_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
}
