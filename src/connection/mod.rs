//! Connection adapter.
//!
//! [`Connection`] is the handle the reconciler and session drive. Events
//! flow the other way on an mpsc channel handed out when the adapter is
//! created, so they are consumed in order on the session's loop.

mod irc;

pub use irc::{EVENT_CHANNEL_CAPACITY, IrcConnection};

use async_trait::async_trait;

use crate::config::{IdentityConfig, IrcSettings};
use crate::error::ConnectionError;

/// Options a connection is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub server: String,
    pub port: u16,
    pub nick: String,
    /// Joined once registration completes.
    pub channels: Vec<String>,
    pub username: String,
    pub realname: String,
}

impl ConnectionOptions {
    pub fn new(settings: &IrcSettings, identity: &IdentityConfig) -> Self {
        Self {
            server: settings.server.clone(),
            port: settings.port,
            nick: settings.nick.clone(),
            channels: settings.channels.clone(),
            username: identity.username.clone(),
            realname: identity.realname.clone(),
        }
    }

    /// Overwrite every settings-derived field; identity is kept.
    pub fn merge(&mut self, settings: &IrcSettings) {
        self.server = settings.server.clone();
        self.port = settings.port;
        self.nick = settings.nick.clone();
        self.channels = settings.channels.clone();
    }
}

/// Something that happened on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Registration finished; `nick` is the nick the server assigned.
    Registered { nick: String },
    /// A PRIVMSG from `from` addressed to `to` (a channel or the bot).
    Message {
        from: String,
        to: String,
        text: String,
    },
    /// Advisory error reported by the server or the transport.
    Error { message: String },
    /// The link closed. `unexpected` is false when we asked for it.
    Disconnected { unexpected: bool },
}

/// A live chat-protocol session.
///
/// Commands are issued without waiting for server acknowledgement, except
/// `disconnect`, which resolves once the link is closed.
#[async_trait]
pub trait Connection: Send {
    fn options(&self) -> &ConnectionOptions;

    fn options_mut(&mut self) -> &mut ConnectionOptions;

    fn is_connected(&self) -> bool;

    /// Open the link with the current options and start registration.
    async fn connect(&mut self) -> Result<(), ConnectionError>;

    async fn disconnect(&mut self) -> Result<(), ConnectionError>;

    async fn join(&mut self, channel: &str) -> Result<(), ConnectionError>;

    async fn part(&mut self, channel: &str) -> Result<(), ConnectionError>;

    /// Send a nick change. The cached option is left to the caller.
    async fn set_nick(&mut self, nick: &str) -> Result<(), ConnectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_settings_and_keeps_identity() {
        let identity = IdentityConfig {
            username: "bridge".into(),
            realname: "Bridge".into(),
        };
        let mut options = ConnectionOptions::new(&IrcSettings::default(), &identity);

        let next = IrcSettings {
            server: "irc.libera.chat".into(),
            port: 6697,
            nick: "corsica2".into(),
            channels: vec!["#new".into()],
        };
        options.merge(&next);

        assert_eq!(options.server, "irc.libera.chat");
        assert_eq!(options.port, 6697);
        assert_eq!(options.nick, "corsica2");
        assert_eq!(options.channels, vec!["#new"]);
        assert_eq!(options.username, "bridge");
        assert_eq!(options.realname, "Bridge");
    }
}
