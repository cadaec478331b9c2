//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use std::path::PathBuf;

// =============================================================================
// IRC Settings Defaults
// =============================================================================

/// Namespace the bridge's settings are stored under.
pub const DEFAULT_NAMESPACE: &str = "corsica-irc";

pub fn default_server() -> String {
    "irc.example.org".to_string()
}

pub fn default_port() -> u16 {
    6667
}

pub fn default_nick() -> String {
    "corsica".to_string()
}

pub fn default_channels() -> Vec<String> {
    vec!["#bots".to_string()]
}

// =============================================================================
// Settings Store Defaults
// =============================================================================

pub fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

pub fn default_settings_path() -> PathBuf {
    PathBuf::from("corsica-settings.toml")
}

pub fn default_poll_interval_ms() -> u64 {
    1000
}

// =============================================================================
// Identity Defaults
// =============================================================================

pub fn default_username() -> String {
    "corsica".to_string()
}

pub fn default_realname() -> String {
    "Corsica IRC bridge".to_string()
}

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_connect_timeout_secs() -> u64 {
    30
}

pub fn default_quit_timeout_secs() -> u64 {
    5
}

pub fn default_retry_count() -> u32 {
    3
}

pub fn default_retry_delay_secs() -> u64 {
    5
}

// =============================================================================
// Metrics Defaults
// =============================================================================

pub fn default_metrics_bind() -> std::net::IpAddr {
    std::net::IpAddr::from([0, 0, 0, 0])
}
