use serde::Deserialize;
use std::net::SocketAddr;

// Re-export feed config type
pub use crate::feed::FeedConfig;

/// Complete Landmark configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandmarkConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Topic naming convention
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    /// `/` separated prefix in front of the building id
    #[serde(default = "default_topic_prefix")]
    pub prefix: String,
}

fn default_topic_prefix() -> String {
    crate::topic::DEFAULT_PREFIX.to_string()
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            prefix: default_topic_prefix(),
        }
    }
}

/// HTTP/WebSocket API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Bearer token required by POST /api/admin/reset. None = unrestricted.
    #[serde(default = "default_admin_token")]
    pub admin_token: Option<String>,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_admin_token() -> Option<String> {
    std::env::var("LANDMARK_ADMIN_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            admin_token: default_admin_token(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// How often to broadcast metrics via WebSocket (seconds)
    #[serde(default = "default_broadcast_interval")]
    pub broadcast_interval_seconds: u64,
    /// Time window for "active building" tracking (seconds)
    #[serde(default = "default_active_window")]
    pub active_window_seconds: i64,
}

fn default_broadcast_interval() -> u64 {
    2
}

fn default_active_window() -> i64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_seconds: default_broadcast_interval(),
            active_window_seconds: default_active_window(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<LandmarkConfig> {
    use anyhow::Context;

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path))?;
    let config: LandmarkConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file '{}'", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LandmarkConfig::default();
        assert_eq!(config.feed.subject, "dom.bldg.>");
        assert_eq!(config.feed.stream_name, "DOM_BLDG");
        assert!(config.feed.reset_on_reconnect);
        assert_eq!(config.topics.prefix, "dom/bldg");
        assert_eq!(config.api.bind_addr.port(), 3000);
        assert_eq!(config.metrics.broadcast_interval_seconds, 2);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [feed]
            url = "nats://example.com:4222"
            subject = "campus.bldg.>"
            stream_name = "CAMPUS_BLDG"
            reset_on_reconnect = false

            [topics]
            prefix = "campus/bldg"

            [api]
            bind_addr = "127.0.0.1:8080"
            admin_token = "secret"

            [metrics]
            broadcast_interval_seconds = 5
            active_window_seconds = 30
        "#;

        let config: LandmarkConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.feed.url, "nats://example.com:4222");
        assert_eq!(config.feed.subject, "campus.bldg.>");
        assert_eq!(config.feed.stream_name, "CAMPUS_BLDG");
        assert!(!config.feed.reset_on_reconnect);
        assert_eq!(config.topics.prefix, "campus/bldg");
        assert_eq!(config.api.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.api.admin_token.as_deref(), Some("secret"));
        assert_eq!(config.metrics.broadcast_interval_seconds, 5);
        assert_eq!(config.metrics.active_window_seconds, 30);
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and keys fall back to defaults
        let toml = r#"
            [metrics]
            broadcast_interval_seconds = 3

            [feed]
            url = "nats://feed:4222"
        "#;

        let config: LandmarkConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.metrics.broadcast_interval_seconds, 3);
        assert_eq!(config.metrics.active_window_seconds, 60);
        assert_eq!(config.feed.subject, "dom.bldg.>");
        assert_eq!(config.topics.prefix, "dom/bldg");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[topics]\nprefix = \"west/bldg\"").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.topics.prefix, "west/bldg");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/landmark.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbind_addr = 42").unwrap();

        let result = load_config(file.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
