//! The live IRC settings record and its stored form.
//!
//! [`IrcSettings`] is the desired state the connection is reconciled
//! against. [`StoredSettings`] is whatever the settings store actually holds,
//! which may predate the current shape (a bare string for `channels`, missing
//! fields). [`StoredSettings::normalize`] turns one into the other.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::defaults::{default_channels, default_nick, default_port, default_server};

/// Desired connection state: endpoint, nickname and joined channels.
///
/// `channels` keeps its order for deterministic join/part issuance but is
/// compared as a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrcSettings {
    pub server: String,
    pub port: u16,
    pub nick: String,
    pub channels: Vec<String>,
}

impl Default for IrcSettings {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: default_port(),
            nick: default_nick(),
            channels: default_channels(),
        }
    }
}

impl IrcSettings {
    /// Whether both records point at the same server and port.
    pub fn same_endpoint(&self, other: &IrcSettings) -> bool {
        self.server == other.server && self.port == other.port
    }
}

/// Channel list as found in the store: older records hold a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelList {
    One(String),
    Many(Vec<String>),
}

/// Settings as persisted. Every field is optional; gaps fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelList>,
}

/// Result of normalizing a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub settings: IrcSettings,
    /// The stored shape differed from the normalized one and should be written back.
    pub needs_write_back: bool,
}

impl StoredSettings {
    /// Resolve against `defaults` and coerce `channels` into a de-duplicated sequence.
    pub fn normalize(self, defaults: &IrcSettings) -> Normalized {
        let mut needs_write_back = false;

        let raw_channels = match self.channels {
            Some(ChannelList::One(channel)) => {
                needs_write_back = true;
                vec![channel]
            }
            Some(ChannelList::Many(channels)) => channels,
            None => defaults.channels.clone(),
        };

        let raw_len = raw_channels.len();
        let mut seen = HashSet::with_capacity(raw_len);
        let channels: Vec<String> = raw_channels
            .into_iter()
            .filter(|channel| seen.insert(channel.clone()))
            .collect();
        if channels.len() != raw_len {
            needs_write_back = true;
        }

        Normalized {
            settings: IrcSettings {
                server: self.server.unwrap_or_else(|| defaults.server.clone()),
                port: self.port.unwrap_or(defaults.port),
                nick: self.nick.unwrap_or_else(|| defaults.nick.clone()),
                channels,
            },
            needs_write_back,
        }
    }
}

impl From<&IrcSettings> for StoredSettings {
    fn from(settings: &IrcSettings) -> Self {
        Self {
            server: Some(settings.server.clone()),
            port: Some(settings.port),
            nick: Some(settings.nick.clone()),
            channels: Some(ChannelList::Many(settings.channels.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let settings = IrcSettings::default();
        assert_eq!(settings.server, "irc.example.org");
        assert_eq!(settings.port, 6667);
        assert_eq!(settings.nick, "corsica");
        assert_eq!(settings.channels, vec!["#bots".to_string()]);
    }

    #[test]
    fn bare_string_channels_become_a_sequence() {
        let stored: StoredSettings = serde_json::from_value(json!({
            "server": "irc.example.org",
            "nick": "corsica",
            "channels": "#bots",
        }))
        .unwrap();

        let normalized = stored.normalize(&IrcSettings::default());
        assert_eq!(normalized.settings.channels, vec!["#bots".to_string()]);
        assert!(normalized.needs_write_back);
    }

    #[test]
    fn sequence_channels_need_no_write_back() {
        let stored: StoredSettings = serde_json::from_value(json!({
            "channels": ["#a", "#b"],
        }))
        .unwrap();

        let normalized = stored.normalize(&IrcSettings::default());
        assert_eq!(normalized.settings.channels, vec!["#a", "#b"]);
        assert!(!normalized.needs_write_back);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let normalized = StoredSettings::default().normalize(&IrcSettings::default());
        assert_eq!(normalized.settings, IrcSettings::default());
        assert!(!normalized.needs_write_back);
    }

    #[test]
    fn duplicate_channels_are_dropped_in_order() {
        let stored = StoredSettings {
            channels: Some(ChannelList::Many(vec![
                "#b".into(),
                "#a".into(),
                "#b".into(),
            ])),
            ..Default::default()
        };

        let normalized = stored.normalize(&IrcSettings::default());
        assert_eq!(normalized.settings.channels, vec!["#b", "#a"]);
        assert!(normalized.needs_write_back);
    }

    #[test]
    fn stored_form_round_trips_through_json() {
        let settings = IrcSettings {
            server: "irc.libera.chat".into(),
            port: 6697,
            nick: "corsica".into(),
            channels: vec!["#x".into()],
        };
        let value = serde_json::to_value(StoredSettings::from(&settings)).unwrap();
        assert_eq!(value["channels"], json!(["#x"]));

        let stored: StoredSettings = serde_json::from_value(value).unwrap();
        assert_eq!(stored.normalize(&IrcSettings::default()).settings, settings);
    }

    #[test]
    fn same_endpoint_compares_server_and_port() {
        let a = IrcSettings::default();
        let mut b = a.clone();
        b.nick = "other".into();
        assert!(a.same_endpoint(&b));
        b.port = 6697;
        assert!(!a.same_endpoint(&b));
    }
}
