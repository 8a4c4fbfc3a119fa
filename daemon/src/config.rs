//! Daemon configuration, read from a TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "twitch_stats.toml";

/// Default upstream API root.
pub const DEFAULT_API_BASE: &str = "https://api.twitch.tv/kraken";

/// Daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session database location.
    #[serde(rename = "DSN")]
    pub dsn: String,

    /// Directory for the monthly log files.
    pub log_dir: String,

    /// Channel to monitor.
    #[serde(rename = "StreamChannel")]
    pub stream_channel: String,

    /// Run one fetch-and-report pass instead of the poll loop.
    #[serde(rename = "TestMode")]
    pub test_mode: bool,

    /// Token sent to the subscriptions endpoint.
    #[serde(rename = "AuthToken")]
    pub auth_token: String,

    /// Seconds between polls.
    #[serde(rename = "MonitorInterval")]
    pub monitor_interval: u64,

    #[serde(rename = "ApiBase")]
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dsn: "twitch_stats.db".to_string(),
            log_dir: ".".to_string(),
            stream_channel: String::new(),
            test_mode: false,
            auth_token: String::new(),
            monitor_interval: 60,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load config, falling back to defaults when the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                // Logging is not up yet; its directory comes from this file.
                eprintln!("Error loading config file: {}", e);
                Self::default()
            }
        }
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;

        if config.log_dir.is_empty() {
            config.log_dir = ".".to_string();
        }
        if config.api_base.is_empty() {
            config.api_base = DEFAULT_API_BASE.to_string();
        }
        Ok(config)
    }

    /// Check the settings the poll loop cannot run without.
    pub fn validate(&self) -> Result<(), Error> {
        if self.stream_channel.trim().is_empty() {
            return Err(Error::ConfigInvalid("StreamChannel is empty".to_string()));
        }
        if self.monitor_interval == 0 {
            return Err(Error::ConfigInvalid(
                "MonitorInterval must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval)
    }
}
