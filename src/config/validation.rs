use super::Config;
use anyhow::Result;
use std::net::IpAddr;
use std::time::Duration;
use tracing::warn;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ConfigValidationError {
            path: "server.port".to_string(),
            message: "Port must be greater than 0".to_string(),
        });
    }

    if config.server.host.parse::<IpAddr>().is_err() {
        errors.push(ConfigValidationError {
            path: "server.host".to_string(),
            message: format!("Not an IP address: {}", config.server.host),
        });
    }

    if config.server.cors_origins.iter().any(|o| o == "*") {
        errors.push(ConfigValidationError {
            path: "server.corsOrigins".to_string(),
            message: "Wildcard origin \"*\" cannot be used with credentialed CORS; list origins explicitly"
                .to_string(),
        });
    }

    if config.server.cors_origins.is_empty() {
        warn!("No CORS origins configured; browsers on other origins will be refused");
    }

    if let Some(compat) = &config.openai_compat {
        match url::Url::parse(&compat.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ConfigValidationError {
                path: "openaiCompat.baseUrl".to_string(),
                message: format!("Unsupported scheme: {}", url.scheme()),
            }),
            Err(e) => errors.push(ConfigValidationError {
                path: "openaiCompat.baseUrl".to_string(),
                message: format!("Invalid URL: {e}"),
            }),
        }

        if compat.idle_timeout == Some(Duration::ZERO) {
            errors.push(ConfigValidationError {
                path: "openaiCompat.idleTimeout".to_string(),
                message: "Idle timeout must be greater than 0; leave it unset to wait indefinitely"
                    .to_string(),
            });
        }
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
