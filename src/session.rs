//! Bridge session: the single loop that owns the connection and the retained settings.
//!
//! Settings updates and connection events arrive on their own ordered
//! channels and are handled one at a time, so reconciliation never overlaps
//! with itself or with message handling.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{Instrument, debug, error, info, warn};

use crate::bus::{COMMAND_TOPIC, CommandPayload, MessageBus};
use crate::config::{ConnectionConfig, IrcSettings, Normalized, validate_settings};
use crate::connection::{Connection, ConnectionEvent};
use crate::error::{BusError, SessionError, StoreError};
use crate::extract::extract_command;
use crate::metrics;
use crate::reconcile::reconcile;
use crate::store::{SettingsHandle, Subscription};
use crate::telemetry::spans;

/// Everything a session runs on.
pub struct SessionParts<C> {
    pub settings: SettingsHandle,
    pub connection: C,
    pub events: mpsc::Receiver<ConnectionEvent>,
    pub bus: Arc<dyn MessageBus>,
    /// Reconnect policy after an unexpected link loss.
    pub policy: ConnectionConfig,
}

/// Whether the session's link is registered with the server.
///
/// Cheap to clone; every clone observes the same state.
#[derive(Debug, Clone, Default)]
pub struct LinkStatus(Arc<AtomicBool>);

impl LinkStatus {
    pub fn is_up(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set_up(&self, up: bool) {
        self.0.store(up, Ordering::Relaxed);
    }
}

/// A started bridge session.
pub struct Session<C> {
    settings: SettingsHandle,
    updates: Subscription,
    updates_open: bool,
    connection: C,
    events: mpsc::Receiver<ConnectionEvent>,
    bus: Arc<dyn MessageBus>,
    retained: IrcSettings,
    policy: ConnectionConfig,
    retries: u32,
    reconnect_at: Option<Instant>,
    status: LinkStatus,
}

impl<C: Connection> Session<C> {
    /// Read and normalize the settings, then open the connection.
    ///
    /// The update subscription is taken before the first read so no change
    /// made in between is missed.
    pub async fn start(parts: SessionParts<C>) -> Result<Self, SessionError> {
        let SessionParts {
            settings,
            mut connection,
            events,
            bus,
            policy,
        } = parts;

        let updates = settings.subscribe();
        let Normalized {
            settings: initial,
            needs_write_back,
        } = settings.load().await?;

        if needs_write_back {
            info!(namespace = %settings.namespace(), "Writing back normalized settings");
            settings.set(&initial).await?;
        }

        validate_settings(&initial).map_err(SessionError::InvalidSettings)?;

        connection.options_mut().merge(&initial);
        connection.connect().await?;
        info!(
            server = %initial.server,
            port = initial.port,
            nick = %initial.nick,
            channels = ?initial.channels,
            "Session started"
        );

        Ok(Self {
            settings,
            updates,
            updates_open: true,
            connection,
            events,
            bus,
            retained: initial,
            policy,
            retries: 0,
            reconnect_at: None,
            status: LinkStatus::default(),
        })
    }

    /// Report link state through `status` instead of a private flag.
    #[must_use]
    pub fn with_status(mut self, status: LinkStatus) -> Self {
        status.set_up(self.status.is_up());
        self.status = status;
        self
    }

    pub fn status(&self) -> &LinkStatus {
        &self.status
    }

    /// Settings the connection was last reconciled to.
    pub fn retained(&self) -> &IrcSettings {
        &self.retained
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Process updates and events until `shutdown` resolves, then disconnect.
    ///
    /// Returns the closed connection.
    pub async fn run<F>(mut self, shutdown: F) -> C
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let reconnect_at = self.reconnect_at;
            tokio::select! {
                update = self.updates.next(), if self.updates_open => match update {
                    Some(update) => self.on_update(update).await,
                    None => {
                        warn!("Settings store closed, no longer following updates");
                        self.updates_open = false;
                    }
                },
                event = self.events.recv() => match event {
                    Some(event) => self.on_event(event).await,
                    None => {
                        error!("Connection event channel closed, stopping session");
                        break;
                    }
                },
                _ = sleep_until(reconnect_at.unwrap_or_else(Instant::now)), if reconnect_at.is_some() => {
                    self.on_reconnect_timer().await;
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        if let Err(e) = self.connection.disconnect().await {
            warn!(error = %e, "Disconnect on shutdown failed");
        }
        self.status.set_up(false);
        self.connection
    }

    async fn on_update(&mut self, update: Result<Normalized, StoreError>) {
        let Normalized {
            settings,
            needs_write_back,
        } = match update {
            Ok(normalized) => normalized,
            Err(e) => {
                metrics::record_settings_update("unreadable");
                warn!(error = %e, "Ignoring unreadable settings update");
                return;
            }
        };

        if let Err(errors) = validate_settings(&settings) {
            metrics::record_settings_update("invalid");
            for e in &errors {
                warn!(error = %e, "Ignoring invalid settings update");
            }
            return;
        }

        if needs_write_back {
            if let Err(e) = self.settings.set(&settings).await {
                warn!(error = %e, "Failed to write back normalized settings");
            }
        }

        let outcome = if settings == self.retained {
            "ignored"
        } else {
            "applied"
        };
        metrics::record_settings_update(outcome);

        if self.reconnect_at.is_some() && !self.connection.is_connected() {
            // The pending reconnect picks these up natively.
            debug!("Link down, deferring settings to the next connect");
            self.connection.options_mut().merge(&settings);
            self.retained = settings;
            return;
        }

        let old = std::mem::take(&mut self.retained);
        self.retained = reconcile(old, settings, Some(&mut self.connection)).await;

        // A reconnect to a new endpoint can fail inside reconcile.
        if !self.connection.is_connected() && self.reconnect_at.is_none() {
            self.status.set_up(false);
            self.schedule_reconnect();
        }
    }

    async fn on_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Registered { nick } => {
                self.retries = 0;
                self.reconnect_at = None;
                self.status.set_up(true);
                if nick != self.retained.nick {
                    info!(requested = %self.retained.nick, assigned = %nick, "Server assigned a different nick");
                    // Retained state first, so the store's echo of this write is a no-op.
                    self.retained.nick = nick.clone();
                    self.connection.options_mut().nick = nick;
                    if let Err(e) = self.settings.set(&self.retained).await {
                        warn!(error = %e, "Failed to persist assigned nick");
                    }
                }
            }
            ConnectionEvent::Message { from, to, text } => {
                let Some(command) = extract_command(&text, &self.retained.nick) else {
                    return;
                };
                if command.is_empty() {
                    return;
                }
                debug!(from = %from, to = %to, command = %command, "Forwarding command");
                if let Err(e) = forward(self.bus.as_ref(), command).await {
                    warn!(error = %e, "Failed to forward command");
                }
            }
            ConnectionEvent::Error { message } => {
                metrics::record_connection_error("server");
                warn!(error = %message, "Connection reported an error");
            }
            ConnectionEvent::Disconnected { unexpected: false } => {
                debug!("Link closed");
                if !self.connection.is_connected() {
                    self.status.set_up(false);
                }
            }
            ConnectionEvent::Disconnected { unexpected: true } => {
                metrics::record_connection_error("link_lost");
                if self.connection.is_connected() {
                    // A newer link already replaced the one that dropped.
                    return;
                }
                self.status.set_up(false);
                self.schedule_reconnect();
            }
        }
    }

    /// Arm the reconnect timer unless the retry budget is spent.
    fn schedule_reconnect(&mut self) {
        if self.retries >= self.policy.retry_count {
            error!(retries = self.retries, "Link lost, giving up on reconnecting");
            return;
        }
        self.retries += 1;
        let delay = self.policy.retry_delay();
        warn!(attempt = self.retries, delay_secs = delay.as_secs(), "Link down, reconnecting");
        self.reconnect_at = Some(Instant::now() + delay);
    }

    async fn on_reconnect_timer(&mut self) {
        self.reconnect_at = None;
        if self.connection.is_connected() {
            return;
        }
        self.connection.options_mut().merge(&self.retained);
        if let Err(e) = self.connection.connect().await {
            metrics::record_connection_error(e.error_code());
            warn!(error = %e, attempt = self.retries, "Reconnect failed");
            self.on_event(ConnectionEvent::Disconnected { unexpected: true })
                .await;
        }
    }
}

async fn forward(bus: &dyn MessageBus, command: &str) -> Result<(), BusError> {
    let payload: Value = serde_json::to_value(CommandPayload { raw: command })?;
    bus.send_message(COMMAND_TOPIC, payload).await?;
    metrics::record_command_forwarded();
    Ok(())
}

/// A session running on its own task.
pub struct Bridge {
    task: JoinHandle<()>,
    status: LinkStatus,
}

impl Bridge {
    /// Start a session and run it until `shutdown` resolves.
    ///
    /// A session that fails to start is logged and the task ends; the error
    /// never reaches the caller.
    pub fn spawn<C, F>(parts: SessionParts<C>, shutdown: F) -> Self
    where
        C: Connection + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let span = spans::session(parts.settings.namespace());
        let status = LinkStatus::default();
        let session_status = status.clone();
        let task = tokio::spawn(
            async move {
                match Session::start(parts).await {
                    Ok(session) => {
                        session.with_status(session_status).run(shutdown).await;
                    }
                    Err(e) => error!(error = %e, "Bridge failed to start"),
                }
            }
            .instrument(span),
        );
        Self { task, status }
    }

    /// Link state of the running session.
    pub fn status(&self) -> LinkStatus {
        self.status.clone()
    }

    /// Wait for the session task to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "Bridge task panicked or was cancelled");
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}
