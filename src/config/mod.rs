//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: bootstrap config (settings store, identity, connection policy, logging, metrics)
//! - [`settings`]: the live IRC settings record and its stored form
//! - [`validation`]: startup and per-update validation
//! - [`defaults`]: serde default functions

pub mod defaults;
mod settings;
mod types;
mod validation;

pub use defaults::DEFAULT_NAMESPACE;
pub use settings::{ChannelList, IrcSettings, Normalized, StoredSettings};
pub use types::{
    Config, ConfigError, ConnectionConfig, IdentityConfig, LogFormat, LoggingConfig,
    MetricsConfig, SettingsConfig, StoreBackend,
};
pub use validation::{ValidationError, validate, validate_settings};
