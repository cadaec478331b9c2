//! Unified error handling for corsica-irc.
//!
//! One error enum per concern, each with a static code for metric labels.
//! Configuration errors live next to the loader in [`crate::config`].

use corsica_irc_proto::ProtocolError;
use thiserror::Error;

use crate::config::ValidationError;

// ============================================================================
// Settings store errors
// ============================================================================

/// Errors raised by a settings store backend or while decoding stored settings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to write settings file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("stored settings have the wrong shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("settings store is closed")]
    Closed,
}

impl StoreError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Serialize(_) => "serialize",
            Self::Decode(_) => "decode",
            Self::Closed => "closed",
        }
    }
}

// ============================================================================
// Connection errors
// ============================================================================

/// Errors raised by a [`crate::connection::Connection`].
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("timed out connecting to {server}:{port}")]
    ConnectTimeout { server: String, port: u16 },

    #[error("not connected")]
    NotConnected,
}

impl ConnectionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Protocol(_) => "protocol",
            Self::ConnectTimeout { .. } => "connect_timeout",
            Self::NotConnected => "not_connected",
        }
    }
}

// ============================================================================
// Message bus errors
// ============================================================================

/// Errors raised while handing a message to the host bus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("message bus is closed")]
    Closed,

    #[error("failed to encode bus message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("bus I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Session errors (startup)
// ============================================================================

/// Errors that stop a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read settings: {0}")]
    Settings(#[from] StoreError),

    #[error("invalid settings: {}", join_errors(.0))]
    InvalidSettings(Vec<ValidationError>),

    #[error("failed to connect: {0}")]
    Connect(#[from] ConnectionError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_codes() {
        assert_eq!(StoreError::Closed.error_code(), "closed");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(StoreError::from(io).error_code(), "io");
    }

    #[test]
    fn test_connection_error_codes() {
        assert_eq!(ConnectionError::NotConnected.error_code(), "not_connected");
        let timeout = ConnectionError::ConnectTimeout {
            server: "irc.example.org".into(),
            port: 6667,
        };
        assert_eq!(timeout.error_code(), "connect_timeout");
        assert_eq!(
            timeout.to_string(),
            "timed out connecting to irc.example.org:6667"
        );
    }

    #[test]
    fn test_invalid_settings_lists_every_error() {
        let err = SessionError::InvalidSettings(vec![
            ValidationError::EmptyServer,
            ValidationError::ZeroPort,
        ]);
        let text = err.to_string();
        assert!(text.contains("server must not be empty"));
        assert!(text.contains("port must not be 0"));
    }
}
