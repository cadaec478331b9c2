//! Core configuration types and loading.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bridge configuration.
///
/// This is the bridge's own bootstrap configuration. The IRC endpoint, nick
/// and channels are not here: they live in the settings store so they can be
/// changed while the bridge runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Where live IRC settings are kept.
    #[serde(default)]
    pub settings: SettingsConfig,
    /// USER registration identity.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Connection timeouts and retry policy.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Log output format.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Settings store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// TOML file, polled for external edits.
    #[default]
    File,
    /// Process-local; settings reset on restart.
    Memory,
}

/// Settings store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Path of the settings file (file backend only).
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
    /// Namespace (table name) holding the IRC settings.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// How often the settings file is checked for external edits.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_settings_path(),
            namespace: default_namespace(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SettingsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Identity sent in `USER` during registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_realname")]
    pub realname: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            realname: default_realname(),
        }
    }
}

/// Connection timeouts and retry policy.
///
/// `retry_count` consecutive reconnect attempts are made after an unexpected
/// link loss, `retry_delay_secs` apart. A successful registration resets the
/// count.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound on waiting for the server to close after QUIT.
    #[serde(default = "default_quit_timeout_secs")]
    pub quit_timeout_secs: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default)]
    pub quit_message: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            quit_timeout_secs: default_quit_timeout_secs(),
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
            quit_message: None,
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_secs(self.quit_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// HTTP endpoint serving `/metrics` and `/healthz`. Port 0 disables it.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_metrics_bind")]
    pub bind: IpAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: 0,
            bind: default_metrics_bind(),
        }
    }
}

impl MetricsConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
