//! # corsica-irc-proto
//!
//! The slice of the IRC client protocol the corsica bridge speaks:
//! line framing, message parsing and serialization for registration,
//! channel membership, messaging and keepalive commands.
//!
//! ## Quick Start
//!
//! ```rust
//! use corsica_irc_proto::{Command, Message};
//!
//! let join = Message::join("#bots");
//! assert_eq!(join.to_string(), "JOIN #bots\r\n");
//!
//! let msg: Message = ":alice!a@host PRIVMSG #bots :corsica: deploy".parse().unwrap();
//! assert_eq!(msg.source_nickname(), Some("alice"));
//! assert!(matches!(msg.command, Command::PRIVMSG(_, _)));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codec;
pub mod command;
pub mod error;
pub mod format;
pub mod line;
pub mod message;
mod parser;
pub mod prefix;

pub use self::codec::IrcCodec;
pub use self::command::Command;
pub use self::error::{MessageParseError, ProtocolError};
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::prefix::Prefix;

/// Maximum IRC line length in bytes, including the trailing CRLF (RFC 2812).
pub const MAX_IRC_LINE_LEN: usize = 512;

/// `RPL_WELCOME`: first numeric after successful registration.
pub const RPL_WELCOME: u16 = 1;

/// `ERR_ERRONEUSNICKNAME`
pub const ERR_ERRONEUSNICKNAME: u16 = 432;

/// `ERR_NICKNAMEINUSE`
pub const ERR_NICKNAMEINUSE: u16 = 433;
