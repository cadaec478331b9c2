//! Settings reconciliation.
//!
//! Turns a change between two [`IrcSettings`] records into the smallest set of
//! protocol actions that brings a live connection in line, then issues them.
//!
//! Order matters:
//! 1. an endpoint change (server or port) is a hard reset: disconnect, merge
//!    the new settings into the connection options, connect, and stop there;
//! 2. a nick change;
//! 3. parts, in the old channel order;
//! 4. joins, in the new channel order.

use std::collections::HashSet;
use tracing::{Instrument, debug, info, warn};

use crate::config::IrcSettings;
use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::metrics;
use crate::telemetry::{ReconcileTimer, spans};

/// One protocol action issued by [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Disconnect, take on these settings, connect again.
    Reconnect(IrcSettings),
    Nick(String),
    Part(String),
    Join(String),
}

impl Action {
    /// Metric label for this action.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reconnect(_) => "reconnect",
            Self::Nick(_) => "nick",
            Self::Part(_) => "part",
            Self::Join(_) => "join",
        }
    }
}

/// Compute the actions that take a connection from `old` to `new`.
///
/// Identical records produce no actions. Channel names are compared as
/// opaque, case-sensitive strings.
pub fn plan(old: &IrcSettings, new: &IrcSettings) -> Vec<Action> {
    if !old.same_endpoint(new) {
        return vec![Action::Reconnect(new.clone())];
    }

    let mut actions = Vec::new();

    if old.nick != new.nick {
        actions.push(Action::Nick(new.nick.clone()));
    }

    let before: HashSet<&str> = old.channels.iter().map(String::as_str).collect();
    let after: HashSet<&str> = new.channels.iter().map(String::as_str).collect();

    actions.extend(
        old.channels
            .iter()
            .filter(|c| !after.contains(c.as_str()))
            .map(|c| Action::Part(c.clone())),
    );
    actions.extend(
        new.channels
            .iter()
            .filter(|c| !before.contains(c.as_str()))
            .map(|c| Action::Join(c.clone())),
    );

    actions
}

/// Apply the change from `old` to `new` to `connection` and return the
/// settings to retain for the next comparison.
///
/// Without a connection nothing happens and `old` is returned as-is. With
/// one, `new` is returned whether or not every action succeeded; failures
/// are logged and counted.
pub async fn reconcile<C>(
    old: IrcSettings,
    new: IrcSettings,
    connection: Option<&mut C>,
) -> IrcSettings
where
    C: Connection + ?Sized,
{
    let Some(connection) = connection else {
        debug!("No connection yet, ignoring settings update");
        return old;
    };

    let actions = plan(&old, &new);
    if actions.is_empty() {
        return new;
    }

    let _timer = ReconcileTimer::start();
    let span = spans::reconcile(actions.len());
    async {
        for action in actions {
            let kind = action.kind();
            let result = apply(connection, action).await;
            metrics::record_action(kind, result.is_ok());
            if let Err(e) = result {
                metrics::record_connection_error(e.error_code());
                warn!(action = kind, error = %e, "Reconcile action failed");
            }
        }
    }
    .instrument(span)
    .await;

    new
}

async fn apply<C>(connection: &mut C, action: Action) -> Result<(), ConnectionError>
where
    C: Connection + ?Sized,
{
    match action {
        Action::Reconnect(settings) => {
            info!(server = %settings.server, port = settings.port, "Endpoint changed, reconnecting");
            // A failed disconnect still leaves the old link torn down.
            if let Err(e) = connection.disconnect().await {
                warn!(error = %e, "Disconnect before reconnect failed");
            }
            connection.options_mut().merge(&settings);
            connection.connect().await
        }
        Action::Nick(nick) => {
            info!(nick = %nick, "Changing nick");
            connection.set_nick(&nick).await?;
            connection.options_mut().nick = nick;
            Ok(())
        }
        Action::Part(channel) => {
            info!(channel = %channel, "Parting channel");
            connection.part(&channel).await
        }
        Action::Join(channel) => {
            info!(channel = %channel, "Joining channel");
            connection.join(&channel).await
        }
    }
}
