//! corsica-irc - IRC bridge for a host message bus.
//!
//! Follows chat on an IRC connection, forwards lines addressed to the bot as
//! commands, and keeps the connection's server, nick and channels in step
//! with a settings record that can change while the bridge runs.

pub mod bus;
pub mod config;
pub mod connection;
pub mod error;
pub mod extract;
pub mod http;
pub mod metrics;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod telemetry;

pub use bus::{COMMAND_TOPIC, ChannelBus, JsonLinesBus, MessageBus, StdoutBus};
pub use config::{Config, IrcSettings};
pub use connection::{Connection, ConnectionEvent, ConnectionOptions, IrcConnection};
pub use extract::extract_command;
pub use reconcile::{Action, plan, reconcile};
pub use session::{Bridge, LinkStatus, Session, SessionParts};
pub use store::{FileStore, MemoryStore, SettingsHandle, SettingsStore};
