mod defaults;
mod types;
mod validation;

pub use defaults::*;
pub use types::*;
pub use validation::*;

use anyhow::{Context, Result};
use std::time::Duration;

/// Top-level chatrelay configuration.
///
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub openai_compat: Option<OpenAiCompatConfig>,
    pub mock: MockConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Config::default();

        if let Some(host) = var(ENV_HOST) {
            config.server.host = host;
        }

        if let Some(port) = var(ENV_PORT) {
            config.server.port = port
                .parse()
                .with_context(|| format!("{ENV_PORT} is not a valid port: {port}"))?;
        }

        if let Some(origins) = var(ENV_CORS_ORIGINS) {
            config.server.cors_origins = split_list(&origins);
        }

        if let Some(ms) = var(ENV_MOCK_DELAY_MS) {
            let ms: u64 = ms
                .parse()
                .with_context(|| format!("{ENV_MOCK_DELAY_MS} is not a number: {ms}"))?;
            config.mock.char_delay = Duration::from_millis(ms);
        }

        if let Some(format) = var(ENV_LOG_FORMAT) {
            config.logging.format = format.parse().map_err(anyhow::Error::msg)?;
        }

        if let (Some(base_url), Some(api_key)) =
            (var(ENV_OPENAI_COMPAT_BASE_URL), var(ENV_OPENAI_COMPAT_API_KEY))
        {
            let idle_timeout = match var(ENV_OPENAI_COMPAT_IDLE_TIMEOUT_SECS) {
                Some(secs) => {
                    let secs: u64 = secs.parse().with_context(|| {
                        format!("{ENV_OPENAI_COMPAT_IDLE_TIMEOUT_SECS} is not a number: {secs}")
                    })?;
                    Some(Duration::from_secs(secs))
                }
                None => None,
            };
            config.openai_compat = Some(OpenAiCompatConfig {
                base_url,
                api_key,
                idle_timeout,
            });
        }

        Ok(config)
    }

    /// Whether the OpenAI-compatible pass-through is available.
    pub fn openai_compat_enabled(&self) -> bool {
        self.openai_compat.is_some()
    }

    /// Validate this configuration, failing on the first report.
    pub fn validate(&self) -> Result<()> {
        validate_config_object(self)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
