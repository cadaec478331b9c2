//! IRC message type, parsing and serialization.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::command::Command;
use crate::error::ProtocolError;
use crate::parser::parse_line;
use crate::prefix::Prefix;

/// An owned IRC message.
///
/// IRCv3 tags are accepted on input and discarded; the bridge never sends them.
///
/// # Example
///
/// ```
/// use corsica_irc_proto::Message;
///
/// let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
/// let reply = Message::privmsg("#channel", "Hello!");
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Message prefix/source (e.g., `nick!user@host`).
    pub prefix: Option<Prefix>,
    /// The IRC command and its parameters.
    pub command: Command,
}

impl Message {
    /// Get the nickname from the message prefix, if present.
    pub fn source_nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nickname)
    }

    /// Create a NICK message.
    #[must_use]
    pub fn nick<N: Into<String>>(nick: N) -> Self {
        Command::NICK(nick.into()).into()
    }

    /// Create a USER registration message (mode `0`).
    #[must_use]
    pub fn user<U, R>(username: U, realname: R) -> Self
    where
        U: Into<String>,
        R: Into<String>,
    {
        Command::USER(username.into(), "0".to_string(), realname.into()).into()
    }

    /// Create a JOIN message for a channel.
    #[must_use]
    pub fn join<C: Into<String>>(channel: C) -> Self {
        Command::JOIN(channel.into(), None).into()
    }

    /// Create a PART message for a channel.
    #[must_use]
    pub fn part<C: Into<String>>(channel: C) -> Self {
        Command::PART(channel.into(), None).into()
    }

    /// Create a PRIVMSG message to a target with text.
    #[must_use]
    pub fn privmsg<T, M>(target: T, text: M) -> Self
    where
        T: Into<String>,
        M: Into<String>,
    {
        Command::PRIVMSG(target.into(), text.into()).into()
    }

    /// Create a PONG answering a PING token.
    #[must_use]
    pub fn pong<S: Into<String>>(token: S) -> Self {
        Command::PONG(token.into(), None).into()
    }

    /// Create a QUIT message.
    #[must_use]
    pub fn quit(reason: Option<String>) -> Self {
        Command::QUIT(reason).into()
    }

    /// Attach a prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message {
            prefix: None,
            command,
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let invalid = |cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        };

        let parsed = parse_line(s).map_err(invalid)?;
        let command = Command::new(parsed.command, parsed.params).map_err(invalid)?;

        Ok(Message {
            prefix: parsed.prefix.map(Prefix::new_from_str),
            command,
        })
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}\r\n", self.command)
    }
}
