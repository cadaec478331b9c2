//! Integration test common infrastructure.
//!
//! Provides an in-process fake IRC server, the peer handle it hands out for
//! each accepted bridge connection, and helpers for wiring up a bridge.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestPeer;
#[allow(unused_imports)]
pub use server::FakeServer;

use corsica_irc::config::{ConnectionConfig, IdentityConfig, IrcSettings};
use corsica_irc::connection::{ConnectionEvent, ConnectionOptions, IrcConnection};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Settings pointing at a local fake server.
#[allow(dead_code)]
pub fn local_settings(port: u16, nick: &str, channels: &[&str]) -> IrcSettings {
    IrcSettings {
        server: "127.0.0.1".to_string(),
        port,
        nick: nick.to_string(),
        channels: channels.iter().map(|c| c.to_string()).collect(),
    }
}

/// Connection policy with short timeouts so failing tests fail fast.
#[allow(dead_code)]
pub fn fast_policy() -> ConnectionConfig {
    ConnectionConfig {
        connect_timeout_secs: 2,
        quit_timeout_secs: 1,
        retry_count: 2,
        retry_delay_secs: 1,
        quit_message: Some("bye".to_string()),
    }
}

/// An unconnected adapter for `settings`.
#[allow(dead_code)]
pub fn irc_connection(settings: &IrcSettings) -> (IrcConnection, mpsc::Receiver<ConnectionEvent>) {
    let options = ConnectionOptions::new(settings, &IdentityConfig::default());
    IrcConnection::new(options, &fast_policy())
}

/// Next connection event, failing after five seconds.
#[allow(dead_code)]
pub async fn next_event(events: &mut mpsc::Receiver<ConnectionEvent>) -> anyhow::Result<ConnectionEvent> {
    timeout(Duration::from_secs(5), events.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("event channel closed"))
}
