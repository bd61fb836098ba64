//! Configuration types for tickstream

use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub telemetry: TelemetryConfig,
}

/// Market data feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// WebSocket endpoint of the feed
    pub url: String,
    /// API token appended to the endpoint query string
    #[serde(default)]
    pub token: String,
}

impl FeedConfig {
    /// Full endpoint URL including the token, when one is configured
    pub fn endpoint(&self) -> String {
        if self.token.is_empty() {
            self.url.clone()
        } else {
            format!("{}?token={}", self.url, self.token)
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [feed]
            url = "wss://ws.finnhub.io"
            token = "abc123"

            [telemetry]
            log_level = "info"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.feed.url, "wss://ws.finnhub.io");
        assert_eq!(config.feed.token, "abc123");
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_endpoint_appends_token() {
        let config = FeedConfig {
            url: "wss://ws.finnhub.io".to_string(),
            token: "abc123".to_string(),
        };
        assert_eq!(config.endpoint(), "wss://ws.finnhub.io?token=abc123");
    }

    #[test]
    fn test_endpoint_without_token() {
        let config = FeedConfig {
            url: "ws://127.0.0.1:8080".to_string(),
            token: String::new(),
        };
        assert_eq!(config.endpoint(), "ws://127.0.0.1:8080");
    }

    #[test]
    fn test_token_defaults_to_empty() {
        let toml = r#"
            [feed]
            url = "ws://localhost"

            [telemetry]
            log_level = "debug"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.feed.token.is_empty());
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
