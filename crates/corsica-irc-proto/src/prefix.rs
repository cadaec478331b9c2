//! IRC message prefix types.
//!
//! A prefix identifies the origin of a message: either a server name or a
//! user's `nick!user@host` mask.

use std::fmt;

/// IRC message prefix.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// Server name (e.g., "irc.example.org")
    ServerName(String),
    /// User prefix: (nickname, username, hostname)
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a prefix string. Lenient: components are not validated.
    ///
    /// A bare name containing a dot and no `!`/`@` is taken as a server name.
    pub fn new_from_str(s: &str) -> Self {
        let (name, rest) = match s.find(['!', '@']) {
            Some(pos) => (&s[..pos], &s[pos..]),
            None => (s, ""),
        };

        if rest.is_empty() && name.contains('.') {
            return Prefix::ServerName(name.to_string());
        }

        let (user, host) = if let Some(after_bang) = rest.strip_prefix('!') {
            match after_bang.split_once('@') {
                Some((user, host)) => (user, host),
                None => (after_bang, ""),
            }
        } else if let Some(host) = rest.strip_prefix('@') {
            ("", host)
        } else {
            ("", "")
        };

        Prefix::Nickname(name.to_string(), user.to_string(), host.to_string())
    }

    /// The nickname, if this prefix names a user.
    pub fn nickname(&self) -> Option<&str> {
        match self {
            Prefix::Nickname(nick, _, _) => Some(nick),
            Prefix::ServerName(_) => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{user}")?;
                }
                if !host.is_empty() {
                    write!(f, "@{host}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_user_mask() {
        let prefix = Prefix::new_from_str("alice!al@example.com");
        assert_eq!(
            prefix,
            Prefix::Nickname("alice".into(), "al".into(), "example.com".into())
        );
        assert_eq!(prefix.nickname(), Some("alice"));
        assert_eq!(prefix.to_string(), "alice!al@example.com");
    }

    #[test]
    fn server_name() {
        let prefix = Prefix::new_from_str("irc.example.org");
        assert_eq!(prefix, Prefix::ServerName("irc.example.org".into()));
        assert_eq!(prefix.nickname(), None);
    }

    #[test]
    fn bare_nick() {
        let prefix = Prefix::new_from_str("corsica");
        assert_eq!(prefix.nickname(), Some("corsica"));
        assert_eq!(prefix.to_string(), "corsica");
    }

    #[test]
    fn nick_with_host_only() {
        let prefix = Prefix::new_from_str("bob@host.example");
        assert_eq!(
            prefix,
            Prefix::Nickname("bob".into(), String::new(), "host.example".into())
        );
    }
}
