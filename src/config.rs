//! Configuration module for feedwatch.

use serde::Deserialize;
use std::path::Path;

use crate::feed::endpoint::{RetrievalEndpoint, DEFAULT_ENDPOINT};
use crate::feed::types::{DEFAULT_POLL_INTERVAL_MS, MAX_FEED_SIZE};
use crate::{FeedwatchError, Result};

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. Logs go to stderr only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Locale configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Language code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory containing `<language>.toml` overrides.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_language() -> String {
    "ru".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            path: None,
        }
    }
}

/// Feed retrieval configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Retrieval endpoint wrapping every feed request.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Fetch feed URLs directly instead of through the endpoint.
    #[serde(default)]
    pub direct: bool,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    20
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_body_bytes() -> u64 {
    MAX_FEED_SIZE
}

fn default_user_agent() -> String {
    format!("feedwatch/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            direct: false,
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// The retrieval endpoint described by this configuration.
    pub fn retrieval_endpoint(&self) -> Result<RetrievalEndpoint> {
        if self.direct {
            return Ok(RetrievalEndpoint::Direct);
        }
        RetrievalEndpoint::proxy(&self.endpoint)
            .map_err(|e| FeedwatchError::Config(format!("fetch.endpoint: {e}")))
    }
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Delay between two refreshes of the same feed, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

/// Feeds subscribed at startup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeedsConfig {
    /// Feed URLs, in subscription order.
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Locale configuration.
    #[serde(default)]
    pub locale: LocaleConfig,
    /// Feed retrieval configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Polling configuration.
    #[serde(default)]
    pub poll: PollConfig,
    /// Startup feeds.
    #[serde(default)]
    pub feeds: FeedsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FeedwatchError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedwatchError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FEEDWATCH_LOG_LEVEL`: Override the log level
    /// - `FEEDWATCH_LOCALE`: Override the language
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("FEEDWATCH_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(language) = std::env::var("FEEDWATCH_LOCALE") {
            if !language.is_empty() {
                self.locale.language = language;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the poll interval is zero
    /// - the retrieval endpoint is not an absolute base URL
    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_ms == 0 {
            return Err(FeedwatchError::Config(
                "poll.interval_ms must be greater than zero".to_string(),
            ));
        }
        self.fetch.retrieval_endpoint()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());

        assert_eq!(config.locale.language, "ru");
        assert!(config.locale.path.is_none());

        assert_eq!(config.fetch.endpoint, "https://allorigins.hexlet.app/get");
        assert!(!config.fetch.direct);
        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert_eq!(config.fetch.read_timeout_secs, 20);
        assert_eq!(config.fetch.total_timeout_secs, 30);
        assert_eq!(config.fetch.max_redirects, 5);
        assert_eq!(config.fetch.max_body_bytes, 5 * 1024 * 1024);
        assert!(config.fetch.user_agent.starts_with("feedwatch/"));

        assert_eq!(config.poll.interval_ms, 5000);
        assert!(config.feeds.urls.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[logging]
level = "debug"
file = "logs/feedwatch.log"

[locale]
language = "en"
path = "locales"

[fetch]
endpoint = "https://proxy.example/get"
direct = true
connect_timeout_secs = 3
read_timeout_secs = 4
total_timeout_secs = 5
max_redirects = 2
max_body_bytes = 1024
user_agent = "test-agent"

[poll]
interval_ms = 250

[feeds]
urls = ["https://a.example/rss", "https://b.example/rss"]
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/feedwatch.log"));
        assert_eq!(config.locale.language, "en");
        assert_eq!(config.locale.path.as_deref(), Some("locales"));
        assert_eq!(config.fetch.endpoint, "https://proxy.example/get");
        assert!(config.fetch.direct);
        assert_eq!(config.fetch.connect_timeout_secs, 3);
        assert_eq!(config.fetch.read_timeout_secs, 4);
        assert_eq!(config.fetch.total_timeout_secs, 5);
        assert_eq!(config.fetch.max_redirects, 2);
        assert_eq!(config.fetch.max_body_bytes, 1024);
        assert_eq!(config.fetch.user_agent, "test-agent");
        assert_eq!(config.poll.interval_ms, 250);
        assert_eq!(config.feeds.urls.len(), 2);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[poll]
interval_ms = 1000
"#;

        let config = Config::parse(toml).unwrap();

        // Specified values
        assert_eq!(config.poll.interval_ms, 1000);

        // Default values
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.locale.language, "ru");
        assert_eq!(config.fetch.max_redirects, 5);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.poll.interval_ms, 5000);
        assert_eq!(config.locale.language, "ru");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        if let Err(FeedwatchError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(FeedwatchError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[feeds]\nurls = [\"https://a.example/rss\"]").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.feeds.urls, vec!["https://a.example/rss".to_string()]);
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_level = std::env::var("FEEDWATCH_LOG_LEVEL").ok();
        let original_locale = std::env::var("FEEDWATCH_LOCALE").ok();

        std::env::set_var("FEEDWATCH_LOG_LEVEL", "trace");
        std::env::set_var("FEEDWATCH_LOCALE", "");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.logging.level, "trace");
        // Empty values do not override
        assert_eq!(config.locale.language, "ru");

        match original_level {
            Some(val) => std::env::set_var("FEEDWATCH_LOG_LEVEL", val),
            None => std::env::remove_var("FEEDWATCH_LOG_LEVEL"),
        }
        match original_locale {
            Some(val) => std::env::set_var("FEEDWATCH_LOCALE", val),
            None => std::env::remove_var("FEEDWATCH_LOCALE"),
        }
    }

    #[test]
    fn test_validate_default() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.poll.interval_ms = 0;
        assert!(matches!(config.validate(), Err(FeedwatchError::Config(_))));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.fetch.endpoint = "not a url".to_string();
        assert!(matches!(config.validate(), Err(FeedwatchError::Config(_))));

        // The endpoint is ignored in direct mode
        config.fetch.direct = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retrieval_endpoint() {
        let mut config = FetchConfig::default();
        assert!(matches!(
            config.retrieval_endpoint().unwrap(),
            RetrievalEndpoint::Proxy(_)
        ));
        config.direct = true;
        assert!(matches!(
            config.retrieval_endpoint().unwrap(),
            RetrievalEndpoint::Direct
        ));
    }
}
