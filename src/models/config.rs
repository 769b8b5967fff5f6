//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Platform;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Orchestration and skip-rule settings
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// External scraping scripts
    #[serde(default)]
    pub scripts: ScriptConfig,

    /// Result caching
    #[serde(default)]
    pub cache: CacheConfig,

    /// Engagement statistics API
    #[serde(default)]
    pub tgstat: TgStatConfig,

    /// Telegram extraction backend
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Instagram login used by the instagram script
    #[serde(default)]
    pub instagram: InstagramConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay secrets from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("TGSTAT_TOKEN") {
            self.tgstat.token = token;
        }
        if let Ok(username) = std::env::var("INSTAGRAM_USERNAME") {
            self.instagram.username = username;
        }
        if let Ok(password) = std::env::var("INSTAGRAM_PASSWORD") {
            self.instagram.password = password;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.processor.check_concurrency == 0 {
            return Err(AppError::validation(
                "processor.check_concurrency must be > 0",
            ));
        }
        if self.processor.extract_concurrency == 0 {
            return Err(AppError::validation(
                "processor.extract_concurrency must be > 0",
            ));
        }
        self.processor.low_value_platform()?;
        self.processor.enrich_platform()?;
        if self.scripts.node_bin.trim().is_empty() {
            return Err(AppError::validation("scripts.node_bin is empty"));
        }
        if self.scripts.timeout_secs == 0 {
            return Err(AppError::validation("scripts.timeout_secs must be > 0"));
        }
        if self.cache.horizon_hours == 0 {
            return Err(AppError::validation("cache.horizon_hours must be > 0"));
        }
        if self.tgstat.enabled && self.tgstat.token.trim().is_empty() {
            return Err(AppError::validation(
                "tgstat.enabled requires tgstat.token (or TGSTAT_TOKEN)",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        Ok(())
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Registration checks allowed in flight at once
    #[serde(default = "defaults::check_concurrency")]
    pub check_concurrency: usize,

    /// Extractions allowed in flight at once
    #[serde(default = "defaults::extract_concurrency")]
    pub extract_concurrency: usize,

    /// Pause after each completed registration check in milliseconds
    #[serde(default = "defaults::cooldown")]
    pub cooldown_ms: u64,

    /// Deadline for a single registration check (0 disables it)
    #[serde(default = "defaults::check_timeout")]
    pub check_timeout_secs: u64,

    /// Channels below this many followers skip the registration check
    #[serde(default = "defaults::min_followers")]
    pub min_followers: u64,

    /// Platform that always skips the registration check
    #[serde(default = "defaults::low_value_platform")]
    pub low_value_platform: String,

    /// Platform whose checked rows get engagement metrics
    #[serde(default = "defaults::enrich_platform")]
    pub enrich_platform: String,
}

impl ProcessorConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn check_timeout(&self) -> Option<Duration> {
        (self.check_timeout_secs > 0).then(|| Duration::from_secs(self.check_timeout_secs))
    }

    pub fn low_value_platform(&self) -> Result<Platform> {
        self.low_value_platform.parse()
    }

    pub fn enrich_platform(&self) -> Result<Platform> {
        self.enrich_platform.parse()
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            check_concurrency: defaults::check_concurrency(),
            extract_concurrency: defaults::extract_concurrency(),
            cooldown_ms: defaults::cooldown(),
            check_timeout_secs: defaults::check_timeout(),
            min_followers: defaults::min_followers(),
            low_value_platform: defaults::low_value_platform(),
            enrich_platform: defaults::enrich_platform(),
        }
    }
}

/// Where and how the scraping scripts run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Interpreter binary
    #[serde(default = "defaults::node_bin")]
    pub node_bin: String,

    /// Directory containing the scripts
    #[serde(default = "defaults::scripts_dir")]
    pub dir: PathBuf,

    /// Deadline for one script run in seconds
    #[serde(default = "defaults::script_timeout")]
    pub timeout_secs: u64,
}

impl ScriptConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            node_bin: defaults::node_bin(),
            dir: defaults::scripts_dir(),
            timeout_secs: defaults::script_timeout(),
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// Root directory of the on-disk cache
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,

    /// Lifetime of cached channel statistics
    #[serde(default = "defaults::horizon_hours")]
    pub horizon_hours: u64,

    /// Lifetime of cached engagement metrics
    #[serde(default = "defaults::engagement_horizon_days")]
    pub engagement_horizon_days: u64,
}

impl CacheConfig {
    pub fn horizon(&self) -> chrono::Duration {
        chrono::Duration::hours(self.horizon_hours as i64)
    }

    pub fn engagement_horizon(&self) -> chrono::Duration {
        chrono::Duration::days(self.engagement_horizon_days as i64)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            dir: defaults::cache_dir(),
            horizon_hours: defaults::horizon_hours(),
            engagement_horizon_days: defaults::engagement_horizon_days(),
        }
    }
}

/// Engagement statistics API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgStatConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "defaults::tgstat_url")]
    pub url: String,

    #[serde(default)]
    pub token: String,
}

impl Default for TgStatConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: defaults::tgstat_url(),
            token: String::new(),
        }
    }
}

/// Which Telegram extractor gets registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TelegramBackend {
    /// Run the headless browser script
    #[default]
    Script,
    /// Fetch the public preview page directly
    Web,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub backend: TelegramBackend,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstagramConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

mod defaults {
    use std::path::PathBuf;

    // Processor defaults
    pub fn check_concurrency() -> usize {
        10
    }
    pub fn extract_concurrency() -> usize {
        4
    }
    pub fn cooldown() -> u64 {
        1000
    }
    pub fn check_timeout() -> u64 {
        120
    }
    pub fn min_followers() -> u64 {
        10_000
    }
    pub fn low_value_platform() -> String {
        "instagram".into()
    }
    pub fn enrich_platform() -> String {
        "telegram".into()
    }

    // Script defaults
    pub fn node_bin() -> String {
        "node".into()
    }
    pub fn scripts_dir() -> PathBuf {
        PathBuf::from("scripts")
    }
    pub fn script_timeout() -> u64 {
        90
    }

    // Cache defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("storage/cache")
    }
    pub fn horizon_hours() -> u64 {
        72
    }
    pub fn engagement_horizon_days() -> u64 {
        30
    }

    // API defaults
    pub fn tgstat_url() -> String {
        "https://api.tgstat.ru/channels/stat".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; chanstat/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.processor.check_concurrency, 10);
        assert_eq!(config.processor.min_followers, 10_000);
        assert_eq!(config.cache.horizon(), chrono::Duration::hours(72));
        assert_eq!(config.processor.cooldown(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [processor]
            check_concurrency = 3
            low_value_platform = "Instagram"

            [telegram]
            backend = "web"
            "#,
        )
        .unwrap();

        assert_eq!(config.processor.check_concurrency, 3);
        assert_eq!(config.processor.cooldown_ms, 1000);
        assert_eq!(
            config.processor.low_value_platform().unwrap(),
            Platform::Instagram
        );
        assert_eq!(config.telegram.backend, TelegramBackend::Web);
        assert_eq!(config.scripts.node_bin, "node");
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.processor.check_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_platform() {
        let mut config = Config::default();
        config.processor.low_value_platform = "myspace".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_token_when_enabled() {
        let mut config = Config::default();
        config.tgstat.enabled = true;
        assert!(config.validate().is_err());
        config.tgstat.token = "secret".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let mut config = ProcessorConfig::default();
        config.check_timeout_secs = 0;
        assert!(config.check_timeout().is_none());
    }
}
