//! Tracing setup, reconcile timing, and span constructors.

use std::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Guard for timing one reconciliation.
///
/// Records latency when dropped.
pub struct ReconcileTimer {
    start: Instant,
}

impl ReconcileTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Drop for ReconcileTimer {
    fn drop(&mut self) {
        crate::metrics::record_reconcile_duration(self.start.elapsed().as_secs_f64());
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for a link task (one TCP session to a server).
    pub fn link(server: &str, port: u16) -> Span {
        info_span!("link", server = %server, port = port)
    }

    /// Span for the session loop.
    pub fn session(namespace: &str) -> Span {
        info_span!("session", namespace = %namespace)
    }

    /// Span for one reconciliation.
    pub fn reconcile(actions: usize) -> Span {
        info_span!("reconcile", actions = actions)
    }
}
