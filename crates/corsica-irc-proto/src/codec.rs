//! IRC message codec for tokio.
//!
//! Encodes and decodes [`Message`] values on top of [`LineCodec`].

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::format::is_illegal_control_char;
use crate::line::LineCodec;
use crate::message::Message;

/// Tokio codec for encoding/decoding IRC messages.
#[derive(Debug, Default)]
pub struct IrcCodec {
    inner: LineCodec,
}

impl IrcCodec {
    /// Create a codec with the RFC line length limit.
    pub fn new() -> Self {
        Self {
            inner: LineCodec::new(),
        }
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            inner: LineCodec::with_max_len(max_len),
        }
    }

    /// Sanitize outgoing message data.
    ///
    /// - Truncates after the first line ending
    /// - Rejects illegal control characters
    pub fn sanitize(mut data: String) -> error::Result<String> {
        if let Some((pos, len)) = ["\r\n", "\r", "\n"]
            .iter()
            .flat_map(|needle| data.find(needle).map(|pos| (pos, needle.len())))
            .min_by_key(|&(pos, _)| pos)
        {
            data.truncate(pos + len);
        }

        if let Some(ch) = data.chars().find(|ch| is_illegal_control_char(*ch)) {
            return Err(ProtocolError::IllegalControlChar(ch));
        }

        Ok(data)
    }
}

/// Items are per-line results: a line that is not valid UTF-8, carries a
/// control character or does not parse yields `Some(Err(_))` and the stream
/// keeps going. Only [fatal](ProtocolError::is_fatal) errors end it.
impl Decoder for IrcCodec {
    type Item = error::Result<Message>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Self::Item>> {
        loop {
            let line = match self.inner.decode(src) {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => return Ok(Some(Err(e))),
            };

            // Blank keepalive lines carry no message.
            if line.trim_end_matches(['\r', '\n']).is_empty() {
                continue;
            }

            return Ok(Some(line.parse::<Message>()));
        }
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        let sanitized = Self::sanitize(msg.to_string())?;
        self.inner.encode(sanitized, dst)
    }
}
