//! Command extraction from chat lines.

/// Separator between the addressed nick and the command.
const ADDRESS_SEPARATOR: &str = ": ";

/// Return the command in `text` if it is addressed to `nick` as `"<nick>: <command>"`.
///
/// Lines not addressed to the bot yield `None`. The nick must match exactly,
/// including case.
pub fn extract_command<'a>(text: &'a str, nick: &str) -> Option<&'a str> {
    if nick.is_empty() {
        return None;
    }
    text.strip_prefix(nick)?.strip_prefix(ADDRESS_SEPARATOR)
}
