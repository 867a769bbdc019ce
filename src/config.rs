//! Configuration for a queue session
//!
//! The host application supplies a [`Config`] at construction time. The core
//! never discovers configuration files or reads the environment on its own;
//! the TOML helpers here exist for hosts that keep their settings on disk.

use crate::constants::{
    DEFAULT_COUNTDOWN_SECS, DEFAULT_DATA_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PLAY_PAUSE_URL,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_TICKS, DEFAULT_REFRESHING_HOLD_SECS, DEFAULT_REORDER_URL,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_JITTER, DEFAULT_RETRY_MAX_DELAY_MS,
    MAX_HTTP_TIMEOUT_SECS, MIN_HTTP_TIMEOUT_SECS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Account whose queue is managed
    pub account: String,
    pub endpoints: EndpointsConfig,
    pub http: HttpConfig,
    pub features: FeaturesConfig,
    pub polling: PollingConfig,
    pub countdown: CountdownConfig,
    pub logging: LoggingConfig,
}

/// Remote endpoint URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub data_url: String,
    pub reorder_url: String,
    pub play_pause_url: String,
}

/// Transport settings and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (10-30)
    pub timeout_secs: u64,
    /// Bearer token sent with every request, if set
    pub api_token: Option<String>,
    /// Retry policy applied to snapshot fetches only
    pub retry: RetryConfig,
}

/// Exponential backoff parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Jitter factor in 0.0-1.0
    pub jitter: f64,
}

/// Feature flags surfaced to the host UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Show the mm:ss refresh countdown
    pub show_countdown: bool,
    /// Allow the operator to switch accounts
    pub show_account_override: bool,
    /// Discard snapshot responses older than one already applied
    pub fence_loads: bool,
}

/// Post-mutation polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_ticks: u32,
}

/// Background refresh countdown
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    pub enabled: bool,
    pub duration_secs: u64,
    /// How long the "refreshing" state is held after a countdown refresh
    pub refreshing_hold_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install a global `fern` dispatcher
    pub enabled: bool,
    /// Level filter: "error", "warn", "info", "debug" or "trace"
    pub level: String,
    /// Append to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            reorder_url: DEFAULT_REORDER_URL.to_string(),
            play_pause_url: DEFAULT_PLAY_PAUSE_URL.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            api_token: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            jitter: DEFAULT_RETRY_JITTER,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            show_countdown: true,
            show_account_override: false,
            fence_loads: true,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_ticks: DEFAULT_POLL_MAX_TICKS,
        }
    }
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_secs: DEFAULT_COUNTDOWN_SECS,
            refreshing_hold_secs: DEFAULT_REFRESHING_HOLD_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid logging level '{}'", self.level))
    }
}

impl Config {
    /// Default configuration for `account`
    pub fn for_account(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse queue configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("data_url", &self.endpoints.data_url),
            ("reorder_url", &self.endpoints.reorder_url),
            ("play_pause_url", &self.endpoints.play_pause_url),
        ] {
            if url.trim().is_empty() {
                anyhow::bail!("endpoints.{} cannot be empty", name);
            }
        }

        if self.http.timeout_secs < MIN_HTTP_TIMEOUT_SECS || self.http.timeout_secs > MAX_HTTP_TIMEOUT_SECS {
            anyhow::bail!(
                "http.timeout_secs must be between {} and {} seconds, got {}",
                MIN_HTTP_TIMEOUT_SECS,
                MAX_HTTP_TIMEOUT_SECS,
                self.http.timeout_secs
            );
        }

        if self.http.retry.max_attempts == 0 {
            anyhow::bail!("http.retry.max_attempts must be at least 1");
        }

        if !(0.0..=1.0).contains(&self.http.retry.jitter) {
            anyhow::bail!("http.retry.jitter must be between 0.0 and 1.0, got {}", self.http.retry.jitter);
        }

        if self.polling.interval_ms == 0 {
            anyhow::bail!("polling.interval_ms must be greater than 0");
        }

        if self.countdown.duration_secs == 0 {
            anyhow::bail!("countdown.duration_secs must be greater than 0");
        }

        self.logging.level_filter()?;

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        let header = format!(
            "# Manage My Queue Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}
