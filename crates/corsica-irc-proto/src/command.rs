//! IRC command types.
//!
//! Only the commands an IRC client bot sends or reacts to are typed; anything
//! else is kept as [`Command::Raw`] and numerics as [`Command::Response`].
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol

use std::fmt::{self, Write};

use crate::error::MessageParseError;

/// IRC command with its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// `NICK nickname`
    NICK(String),
    /// `USER username mode realname`
    USER(String, String, String),
    /// `QUIT [message]`
    QUIT(Option<String>),
    /// `JOIN channel [key]`
    JOIN(String, Option<String>),
    /// `PART channel [message]`
    PART(String, Option<String>),
    /// `PRIVMSG target text`
    PRIVMSG(String, String),
    /// `NOTICE target text`
    NOTICE(String, String),
    /// `PING server [server2]`
    PING(String, Option<String>),
    /// `PONG server [server2]`
    PONG(String, Option<String>),
    /// `ERROR message`
    ERROR(String),
    /// Numeric reply with its arguments.
    Response(u16, Vec<String>),
    /// Any other command, verbatim.
    Raw(String, Vec<String>),
}

fn require(command: &str, args: &[&str], expected: usize) -> Result<(), MessageParseError> {
    if args.len() < expected {
        return Err(MessageParseError::NotEnoughArguments {
            command: command.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn opt(args: &[&str], idx: usize) -> Option<String> {
    args.get(idx).map(|s| (*s).to_owned())
}

impl Command {
    /// Build a command from its name and already-split arguments.
    pub fn new(cmd: &str, args: Vec<&str>) -> Result<Command, MessageParseError> {
        if cmd.is_empty() {
            return Err(MessageParseError::InvalidCommand);
        }

        let cmd_upper = cmd.to_ascii_uppercase();
        let command = match cmd_upper.as_str() {
            "NICK" => {
                require("NICK", &args, 1)?;
                Command::NICK(args[0].to_owned())
            }
            "USER" => {
                require("USER", &args, 4)?;
                Command::USER(args[0].to_owned(), args[1].to_owned(), args[3].to_owned())
            }
            "QUIT" => Command::QUIT(opt(&args, 0)),
            "JOIN" => {
                require("JOIN", &args, 1)?;
                Command::JOIN(args[0].to_owned(), opt(&args, 1))
            }
            "PART" => {
                require("PART", &args, 1)?;
                Command::PART(args[0].to_owned(), opt(&args, 1))
            }
            "PRIVMSG" => {
                require("PRIVMSG", &args, 2)?;
                Command::PRIVMSG(args[0].to_owned(), args[1].to_owned())
            }
            "NOTICE" => {
                require("NOTICE", &args, 2)?;
                Command::NOTICE(args[0].to_owned(), args[1].to_owned())
            }
            "PING" => {
                require("PING", &args, 1)?;
                Command::PING(args[0].to_owned(), opt(&args, 1))
            }
            "PONG" => {
                require("PONG", &args, 1)?;
                Command::PONG(args[0].to_owned(), opt(&args, 1))
            }
            "ERROR" => {
                require("ERROR", &args, 1)?;
                Command::ERROR(args[0].to_owned())
            }
            _ => match numeric(cmd) {
                Some(code) => {
                    Command::Response(code, args.into_iter().map(str::to_owned).collect())
                }
                None => Command::Raw(cmd.to_owned(), args.into_iter().map(str::to_owned).collect()),
            },
        };

        Ok(command)
    }

    /// The numeric code, if this is a numeric reply.
    pub fn response_code(&self) -> Option<u16> {
        match self {
            Command::Response(code, _) => Some(*code),
            _ => None,
        }
    }
}

fn numeric(cmd: &str) -> Option<u16> {
    if cmd.len() == 3 && cmd.bytes().all(|b| b.is_ascii_digit()) {
        cmd.parse().ok()
    } else {
        None
    }
}

/// Whether a parameter must be sent as a trailing (`:`-prefixed) parameter.
fn needs_colon_prefix(arg: &str) -> bool {
    arg.is_empty() || arg.contains(' ') || arg.starts_with(':')
}

/// Write a command whose last parameter only gets a colon when required.
fn write_cmd(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    f.write_str(cmd)?;
    if let Some((last, middle)) = args.split_last() {
        for arg in middle {
            f.write_char(' ')?;
            f.write_str(arg)?;
        }
        f.write_char(' ')?;
        if needs_colon_prefix(last) {
            f.write_char(':')?;
        }
        f.write_str(last)?;
    }
    Ok(())
}

/// Write a command whose last parameter is free-form text (always colon-prefixed).
fn write_cmd_freeform(f: &mut fmt::Formatter<'_>, cmd: &str, args: &[&str]) -> fmt::Result {
    f.write_str(cmd)?;
    if let Some((last, middle)) = args.split_last() {
        for arg in middle {
            f.write_char(' ')?;
            f.write_str(arg)?;
        }
        f.write_str(" :")?;
        f.write_str(last)?;
    }
    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::NICK(n) => write_cmd(f, "NICK", &[n]),
            Command::USER(u, m, r) => write_cmd_freeform(f, "USER", &[u, m, "*", r]),
            Command::QUIT(Some(m)) => write_cmd_freeform(f, "QUIT", &[m]),
            Command::QUIT(None) => write_cmd(f, "QUIT", &[]),
            Command::JOIN(c, Some(k)) => write_cmd(f, "JOIN", &[c, k]),
            Command::JOIN(c, None) => write_cmd(f, "JOIN", &[c]),
            Command::PART(c, Some(m)) => write_cmd_freeform(f, "PART", &[c, m]),
            Command::PART(c, None) => write_cmd(f, "PART", &[c]),
            Command::PRIVMSG(t, m) => write_cmd_freeform(f, "PRIVMSG", &[t, m]),
            Command::NOTICE(t, m) => write_cmd_freeform(f, "NOTICE", &[t, m]),
            Command::PING(s, Some(t)) => write_cmd(f, "PING", &[s, t]),
            Command::PING(s, None) => write_cmd(f, "PING", &[s]),
            Command::PONG(s, Some(t)) => write_cmd(f, "PONG", &[s, t]),
            Command::PONG(s, None) => write_cmd(f, "PONG", &[s]),
            Command::ERROR(m) => write_cmd_freeform(f, "ERROR", &[m]),
            Command::Response(code, args) => {
                let code = format!("{code:03}");
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                write_cmd(f, &code, &args)
            }
            Command::Raw(cmd, args) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                write_cmd(f, cmd, &args)
            }
        }
    }
}
