//! Client configuration.
//!
//! Loaded from `config.toml` by `aingine-infrastructure::ConfigService`;
//! every field is optional and falls back to the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 200;
pub const DEFAULT_SWAP_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_GENERATE_TIMEOUT_SECS: u64 = 120;

/// Environment variable overriding `gateway_url`.
pub const ENV_GATEWAY_URL: &str = "AINGINE_API_URL";
/// Environment variable overriding `default_api_key`.
pub const ENV_DEFAULT_API_KEY: &str = "AINGINE_ENGINE_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Gateway base URL. Normalized by [`normalize_base_url`] before use.
    pub gateway_url: String,
    pub poll_interval_secs: u64,
    pub max_tokens: u32,
    pub swap_timeout_secs: u64,
    pub generate_timeout_secs: u64,
    /// Credential used when the user has not stored an override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            swap_timeout_secs: DEFAULT_SWAP_TIMEOUT_SECS,
            generate_timeout_secs: DEFAULT_GENERATE_TIMEOUT_SECS,
            default_api_key: None,
        }
    }
}

impl ClientConfig {
    /// Applies environment overrides from the given lookup.
    ///
    /// Takes a lookup function rather than reading `std::env` directly so the
    /// precedence can be tested.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_GATEWAY_URL).filter(|v| !v.trim().is_empty()) {
            self.gateway_url = url;
        }
        if let Some(key) = lookup(ENV_DEFAULT_API_KEY).filter(|v| !v.is_empty()) {
            self.default_api_key = Some(key);
        }
        self
    }

    pub fn base_url(&self) -> String {
        normalize_base_url(&self.gateway_url)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic.
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn swap_timeout(&self) -> Duration {
        Duration::from_secs(self.swap_timeout_secs)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

/// Coerces a configured gateway address into a base URL.
///
/// Addresses that do not start with `http` get an `https://` scheme;
/// trailing slashes are removed.
pub fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_https() {
        assert_eq!(
            normalize_base_url("gateway.example.com"),
            "https://gateway.example.com"
        );
    }

    #[test]
    fn test_absolute_url_is_kept() {
        assert_eq!(
            normalize_base_url("http://localhost:8000/"),
            "http://localhost:8000"
        );
        assert_eq!(
            normalize_base_url("https://gw.example.com//"),
            "https://gw.example.com"
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("gateway_url = \"gw.local\"").unwrap();
        assert_eq!(config.gateway_url, "gw.local");
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.default_api_key, None);
        assert_eq!(config.base_url(), "https://gw.local");
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::default().with_env_overrides(|name| match name {
            ENV_GATEWAY_URL => Some("https://tunnel.example.com".to_string()),
            ENV_DEFAULT_API_KEY => Some("master".to_string()),
            _ => None,
        });
        assert_eq!(config.gateway_url, "https://tunnel.example.com");
        assert_eq!(config.default_api_key.as_deref(), Some("master"));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let config = ClientConfig::default().with_env_overrides(|_| Some(String::new()));
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.default_api_key, None);
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = ClientConfig {
            poll_interval_secs: 0,
            ..ClientConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
