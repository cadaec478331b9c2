//! Character classification for IRC text.

/// Check whether a character is an IRC formatting code (bold, color, CTCP delimiter, ...).
#[inline]
pub fn is_irc_format_code(ch: char) -> bool {
    matches!(
        ch,
        '\x01' | '\x02' | '\x03' | '\x04' | '\x0F' | '\x11' | '\x16' | '\x1D' | '\x1E' | '\x1F'
    )
}

/// Check whether a character must be rejected in an IRC line.
///
/// CR, LF and NUL are allowed here; line framing deals with them.
#[inline]
pub fn is_illegal_control_char(ch: char) -> bool {
    if ch == '\x07' {
        return true;
    }
    ch.is_control() && ch != '\r' && ch != '\n' && ch != '\0' && !is_irc_format_code(ch)
}
