//! Router configuration from the environment.
//!
//! The launcher drives the router through its environment (host/port
//! overrides, mock-backend flag), so configuration is read once at startup
//! from env vars with sensible localhost defaults.

use std::time::Duration;

/// Router service configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bind host (`TOOLBUS_ROUTER_HOST`).
    pub host: String,
    /// Bind port (`TOOLBUS_ROUTER_PORT`).
    pub port: u16,
    /// Base URL of the asset-authoring backend (`TOOLBUS_ASSET_URL`).
    pub asset_backend_url: String,
    /// Base URL of the engine backend (`TOOLBUS_ENGINE_URL`).
    pub engine_backend_url: String,
    /// Answer backend namespaces locally instead of proxying
    /// (`TOOLBUS_MOCK_BACKENDS`).
    pub mock_backends: bool,
    /// Per-request bound on backend proxy calls.
    pub backend_timeout: Duration,
    pub ai: AiConfig,
}

/// Generative-provider configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Provider label reported in responses (`AI_PROVIDER`).
    pub provider: String,
    /// Model name sent upstream (`AI_MODEL`).
    pub model: String,
    /// API key (`OPENAI_API_KEY`); when absent every generation request is
    /// answered with fallback content.
    pub api_key: Option<String>,
    /// Provider base URL (`OPENAI_BASE_URL`).
    pub base_url: String,
    /// Per-request bound on provider calls.
    pub request_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            asset_backend_url: "http://127.0.0.1:8081".to_string(),
            engine_backend_url: "http://127.0.0.1:8082".to_string(),
            mock_backends: false,
            backend_timeout: Duration::from_secs(30),
            ai: AiConfig::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4-turbo".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RouterConfig {
    /// Build a configuration from the process environment, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("TOOLBUS_ROUTER_HOST").unwrap_or(defaults.host),
            port: env_string("TOOLBUS_ROUTER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            asset_backend_url: env_string("TOOLBUS_ASSET_URL")
                .unwrap_or(defaults.asset_backend_url),
            engine_backend_url: env_string("TOOLBUS_ENGINE_URL")
                .unwrap_or(defaults.engine_backend_url),
            mock_backends: env_bool("TOOLBUS_MOCK_BACKENDS"),
            backend_timeout: defaults.backend_timeout,
            ai: AiConfig::from_env(),
        }
    }
}

impl AiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider: env_string("AI_PROVIDER").unwrap_or(defaults.provider),
            model: env_string("AI_MODEL").unwrap_or(defaults.model),
            api_key: env_string("OPENAI_API_KEY"),
            base_url: env_string("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: defaults.request_timeout,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_bool(name: &str) -> bool {
    env_string(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.port, 8080);
        assert!(!config.mock_backends);
        assert!(config.ai.api_key.is_none());
        assert_eq!(config.ai.model, "gpt-4-turbo");
    }
}
