/// Default configuration constants used across the system.

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default allowed CORS origin (the frontend dev server).
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Default pause before each character of a mock reply.
pub const DEFAULT_MOCK_CHAR_DELAY_MS: u64 = 10;

/// Environment variables read at startup.
pub const ENV_OPENAI_COMPAT_BASE_URL: &str = "OPENAI_COMPAT_BASE_URL";
pub const ENV_OPENAI_COMPAT_API_KEY: &str = "OPENAI_COMPAT_API_KEY";
pub const ENV_OPENAI_COMPAT_IDLE_TIMEOUT_SECS: &str = "OPENAI_COMPAT_IDLE_TIMEOUT_SECS";
pub const ENV_HOST: &str = "CHATRELAY_HOST";
pub const ENV_PORT: &str = "CHATRELAY_PORT";
pub const ENV_CORS_ORIGINS: &str = "CHATRELAY_CORS_ORIGINS";
pub const ENV_MOCK_DELAY_MS: &str = "CHATRELAY_MOCK_DELAY_MS";
pub const ENV_LOG_FORMAT: &str = "CHATRELAY_LOG_FORMAT";
