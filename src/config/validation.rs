//! Configuration validation.
//!
//! Validates the bootstrap config at startup and every IRC settings record
//! before it is acted on.

use super::{Config, IrcSettings};
use thiserror::Error;

/// Validation errors for configuration and settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server must not be empty")]
    EmptyServer,
    #[error("port must not be 0")]
    ZeroPort,
    #[error("nick must be non-empty without whitespace or ':', got '{0}'")]
    InvalidNick(String),
    #[error("channel must be non-empty without whitespace or ',', got '{0}'")]
    InvalidChannel(String),
    #[error("settings.namespace is required")]
    EmptyNamespace,
    #[error("settings.poll_interval_ms must be greater than 0")]
    ZeroPollInterval,
    #[error("identity.username must be non-empty without whitespace, got '{0}'")]
    InvalidUsername(String),
}

/// A nick is used as a literal prefix when matching commands (`<nick>: ...`),
/// so it must not contain the separator or whitespace.
fn is_valid_nick(nick: &str) -> bool {
    !nick.is_empty() && !nick.chars().any(|c| c.is_whitespace() || c == ':')
}

/// Channel identifiers are opaque; only characters that would split the
/// JOIN/PART parameter are refused.
fn is_valid_channel(channel: &str) -> bool {
    !channel.is_empty() && !channel.chars().any(|c| c.is_whitespace() || c == ',')
}

/// Validate an IRC settings record, returning all errors found.
pub fn validate_settings(settings: &IrcSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.server.trim().is_empty() {
        errors.push(ValidationError::EmptyServer);
    }
    if settings.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !is_valid_nick(&settings.nick) {
        errors.push(ValidationError::InvalidNick(settings.nick.clone()));
    }
    for channel in &settings.channels {
        if !is_valid_channel(channel) {
            errors.push(ValidationError::InvalidChannel(channel.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the bootstrap configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.settings.namespace.is_empty() {
        errors.push(ValidationError::EmptyNamespace);
    }
    if config.settings.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    let username = &config.identity.username;
    if username.is_empty() || username.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidUsername(username.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
