//! Prometheus metrics for the bridge.
//!
//! - `corsica_irc_reconcile_actions_total{action,result}` - protocol actions issued by reconciliation
//! - `corsica_irc_reconcile_duration_seconds` - time spent issuing one reconciliation
//! - `corsica_irc_settings_updates_total{outcome}` - settings notifications by outcome
//! - `corsica_irc_commands_forwarded_total` - commands handed to the message bus
//! - `corsica_irc_connection_errors_total{kind}` - advisory connection errors
//!
//! Recording before [`init`] is a no-op, so library users that never call it
//! pay nothing.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Registry for all bridge metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

pub static RECONCILE_ACTIONS: OnceLock<IntCounterVec> = OnceLock::new();

pub static RECONCILE_DURATION: OnceLock<Histogram> = OnceLock::new();

pub static SETTINGS_UPDATES: OnceLock<IntCounterVec> = OnceLock::new();

pub static COMMANDS_FORWARDED: OnceLock<IntCounter> = OnceLock::new();

pub static CONNECTION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the metrics registry. Safe to call more than once.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    if RECONCILE_ACTIONS.get().is_some() {
        return;
    }

    register!(RECONCILE_ACTIONS, IntCounterVec::new(
        Opts::new("corsica_irc_reconcile_actions_total", "Protocol actions issued by reconciliation"),
        &["action", "result"]));
    register!(RECONCILE_DURATION, Histogram::with_opts(
        HistogramOpts::new("corsica_irc_reconcile_duration_seconds", "Time spent issuing one reconciliation")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0])));
    register!(SETTINGS_UPDATES, IntCounterVec::new(
        Opts::new("corsica_irc_settings_updates_total", "Settings update notifications by outcome"),
        &["outcome"]));
    register!(COMMANDS_FORWARDED, IntCounter::new(
        "corsica_irc_commands_forwarded_total", "Commands forwarded to the message bus"));
    register!(CONNECTION_ERRORS, IntCounterVec::new(
        Opts::new("corsica_irc_connection_errors_total", "Advisory connection errors"),
        &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Record one reconcile action (`reconnect`, `nick`, `join`, `part`).
#[inline]
pub fn record_action(action: &str, ok: bool) {
    if let Some(c) = RECONCILE_ACTIONS.get() {
        let result = if ok { "ok" } else { "error" };
        c.with_label_values(&[action, result]).inc();
    }
}

#[inline]
pub fn record_reconcile_duration(duration_secs: f64) {
    if let Some(h) = RECONCILE_DURATION.get() {
        h.observe(duration_secs);
    }
}

/// Record a settings notification outcome (`applied`, `invalid`, `unreadable`, `ignored`).
#[inline]
pub fn record_settings_update(outcome: &str) {
    if let Some(c) = SETTINGS_UPDATES.get() {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_command_forwarded() {
    if let Some(c) = COMMANDS_FORWARDED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_connection_error(kind: &str) {
    if let Some(c) = CONNECTION_ERRORS.get() {
        c.with_label_values(&[kind]).inc();
    }
}
