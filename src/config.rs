//! Configuration for the modem exporter.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locator::{DEFAULT_DOWNSTREAM, DEFAULT_UPSTREAM, Locator};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Modem polling settings.
    #[serde(default)]
    pub modem: ModemConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Modem polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    /// Status page URL (default: "http://192.168.100.1/cgi-bin/status_cgi").
    #[serde(default = "default_source_url")]
    pub source_url: String,

    /// Seconds between poll cycles (default: 30).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Fetch timeout in seconds (default: 5).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Locator for the downstream channel table (default: "//table[2]/tbody").
    #[serde(default = "default_downstream_locator")]
    pub downstream_locator: String,

    /// Locator for the upstream channel table (default: "//table[4]/tbody").
    #[serde(default = "default_upstream_locator")]
    pub upstream_locator: String,
}

fn default_source_url() -> String {
    "http://192.168.100.1/cgi-bin/status_cgi".to_string()
}

fn default_poll_interval() -> u64 {
    30
}

fn default_timeout() -> u64 {
    5
}

fn default_downstream_locator() -> String {
    DEFAULT_DOWNSTREAM.to_string()
}

fn default_upstream_locator() -> String {
    DEFAULT_UPSTREAM.to_string()
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout(),
            downstream_locator: default_downstream_locator(),
            upstream_locator: default_upstream_locator(),
        }
    }
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to listen on (default: "127.0.0.1:9143").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for the metrics endpoint (default: "/metrics").
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Directory served under /static, if any.
    #[serde(default)]
    pub static_dir: Option<String>,
}

fn default_listen() -> String {
    "127.0.0.1:9143".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_path: default_metrics_path(),
            static_dir: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl MonitorConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: MonitorConfig = json5::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modem.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.modem.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        for locator in [&self.modem.downstream_locator, &self.modem.upstream_locator] {
            if let Err(e) = locator.parse::<Locator>() {
                return Err(ConfigError::Validation(e.to_string()));
            }
        }

        if self.http.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.http.listen
            )));
        }

        if !self.http.metrics_path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        Ok(())
    }
}
