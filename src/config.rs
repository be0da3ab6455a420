//! Configuration file parser for ~/.config/newsdesk/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged as a warning, since they are
//! usually typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::detail::RelatedSettings;
use crate::feed::FeedSettings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the news API; `/news` is appended to it.
    pub api_base_url: String,

    /// Public site whose `/news/{id}` pages are copied as article links.
    pub site_base_url: String,

    /// Articles per home feed page.
    pub page_size: u32,

    /// Articles fetched for the lead slot.
    pub lead_size: u32,

    /// Pages shorter than this end pagination.
    pub exhaust_threshold: usize,

    /// Related articles shown under an article.
    pub related_limit: usize,

    /// `limit` used for the related title search and category fetch.
    pub search_limit: u32,

    pub request_timeout_secs: u64,

    /// Retries for transient failures (timeouts, 5xx, 429). 0 disables,
    /// at most [`Config::MAX_RETRIES`].
    pub max_retries: u32,

    /// Quiet period before a search query is sent.
    pub search_debounce_ms: u64,

    /// Minimum spacing between manual feed reloads.
    pub refresh_throttle_ms: u64,

    /// Fraction of the end-of-list marker that must be visible to load more.
    pub sentinel_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            site_base_url: "https://www.fact-news.info".to_string(),
            page_size: 15,
            lead_size: 1,
            exhaust_threshold: 6,
            related_limit: 3,
            search_limit: 10,
            request_timeout_secs: 20,
            max_retries: 3,
            search_debounce_ms: 500,
            refresh_throttle_ms: 1000,
            sentinel_threshold: 0.1,
        }
    }
}

const KNOWN_KEYS: [&str; 12] = [
    "api_base_url",
    "site_base_url",
    "page_size",
    "lead_size",
    "exhaust_threshold",
    "related_limit",
    "search_limit",
    "request_timeout_secs",
    "max_retries",
    "search_debounce_ms",
    "refresh_throttle_ms",
    "sentinel_threshold",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Upper bound for `max_retries`.
    pub const MAX_RETRIES: u32 = 10;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        Self::parse(&content).inspect(|config| {
            tracing::info!(
                path = %path.display(),
                api = %config.api_base_url,
                "Loaded configuration"
            );
        })
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.lead_size == 0 {
            return Err(ConfigError::Invalid("lead_size must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.max_retries > Self::MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "max_retries must be at most {}, got {}",
                Self::MAX_RETRIES,
                self.max_retries
            )));
        }
        match url::Url::parse(&self.site_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "site_base_url must be an http(s) URL, got '{}'",
                    self.site_base_url
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.sentinel_threshold) {
            return Err(ConfigError::Invalid(format!(
                "sentinel_threshold must be between 0 and 1, got {}",
                self.sentinel_threshold
            )));
        }
        Ok(())
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            page_size: self.page_size,
            lead_size: self.lead_size,
            exhaust_threshold: self.exhaust_threshold,
        }
    }

    pub fn related_settings(&self) -> RelatedSettings {
        RelatedSettings {
            limit: self.related_limit,
            search_limit: self.search_limit,
            ..RelatedSettings::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn refresh_throttle(&self) -> Duration {
        Duration::from_millis(self.refresh_throttle_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("newsdesk_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.page_size, 15);
        assert_eq!(config.lead_size, 1);
        assert_eq!(config.exhaust_threshold, 6);
        assert_eq!(config.related_limit, 3);
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.search_debounce_ms, 500);
        assert_eq!(config.refresh_throttle_ms, 1000);
        assert_eq!(config.feed_settings(), FeedSettings::default());
        assert_eq!(config.related_settings(), RelatedSettings::default());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdesk_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "page_size = 20\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.exhaust_threshold, 6);
        assert_eq!(config.feed_settings().page_size, 20);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_base_url = "https://news.example.com/api"
site_base_url = "https://news.example.com"
page_size = 30
lead_size = 2
exhaust_threshold = 30
related_limit = 5
search_limit = 20
request_timeout_secs = 5
max_retries = 0
search_debounce_ms = 250
refresh_throttle_ms = 2000
sentinel_threshold = 0.5
"#;
        let path = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.api_base_url, "https://news.example.com/api");
        assert_eq!(config.site_base_url, "https://news.example.com");
        assert_eq!(config.lead_size, 2);
        assert_eq!(config.related_settings().limit, 5);
        assert_eq!(config.related_settings().search_limit, 20);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.search_debounce(), Duration::from_millis(250));
        assert_eq!(config.refresh_throttle(), Duration::from_millis(2000));
        assert_eq!(config.sentinel_threshold, 0.5);
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("page_size = 15\ntotally_fake_key = \"x\"\n").unwrap();
        assert_eq!(config.page_size, 15);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(matches!(
            Config::parse("page_size = \"fifteen\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(matches!(
            Config::parse("page_size = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("sentinel_threshold = 1.5\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("request_timeout_secs = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("site_base_url = \"news.example.com\"\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_max_retries_is_capped() {
        assert_eq!(Config::parse("max_retries = 10\n").unwrap().max_retries, 10);
        let err = Config::parse("max_retries = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }
}
