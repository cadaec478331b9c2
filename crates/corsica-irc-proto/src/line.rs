//! Line-based codec for tokio.
//!
//! Reads and writes newline-terminated UTF-8 lines.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::format::is_illegal_control_char;
use crate::MAX_IRC_LINE_LEN;

/// Line-based codec that handles newline-terminated messages.
///
/// Lines are limited to [`MAX_IRC_LINE_LEN`] bytes by default.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a codec with the RFC line length limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_IRC_LINE_LEN)
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    fn validate_line(s: &str) -> error::Result<()> {
        let trimmed = s.trim_end_matches(['\r', '\n']);
        match trimmed.chars().find(|ch| is_illegal_control_char(*ch)) {
            Some(ch) => Err(ProtocolError::IllegalControlChar(ch)),
            None => Ok(()),
        }
    }
}

/// A line that fails UTF-8 or control character validation is consumed
/// before the error is returned, so decoding can resume with the next line.
impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let data = String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidUtf8 {
                byte_pos: e.utf8_error().valid_up_to(),
                raw_line: e.into_bytes(),
            })?;

            Self::validate_line(&data)?;

            Ok(Some(data))
        } else {
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(msg.as_bytes());
        Ok(())
    }
}
