//! Line framing and charset handling for the socket.
//!
//! [`LineCodec`] turns the byte stream into CRLF-delimited lines and
//! back. Inbound it is deliberately lenient: bare `\r` or `\n` also
//! terminate a line, and empty lines (a server sending `\r\n\r\n`) are
//! skipped rather than surfaced as parse errors. Outbound it appends the
//! CRLF terminator.
//!
//! Charset conversion is best-effort via [`EncodingShim`]: a configured
//! target encoding enables source-charset detection, a fallback encoding
//! rescues non-UTF-8 bytes, and any conversion problem degrades to lossy
//! UTF-8 rather than an error.

use bytes::{BufMut, BytesMut};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};

/// Upper bound on one inbound line; guards the read buffer against a
/// peer that never sends a newline.
pub const MAX_LINE_LEN: usize = 8191;

/// Best-effort charset conversion for inbound and outbound bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodingShim {
    target: Option<&'static Encoding>,
    fallback: Option<&'static Encoding>,
}

impl EncodingShim {
    /// Build a shim from encoding labels (e.g. `"utf-8"`, `"latin1"`).
    ///
    /// Unknown labels are ignored, matching the swallow-errors contract.
    pub fn new(target: Option<&str>, fallback: Option<&str>) -> Self {
        Self {
            target: target.and_then(|l| Encoding::for_label(l.as_bytes())),
            fallback: fallback.and_then(|l| Encoding::for_label(l.as_bytes())),
        }
    }

    /// Decode one inbound line's bytes into text.
    ///
    /// With a target encoding configured, the source charset is detected
    /// and the bytes transcoded; detection trouble falls through to
    /// UTF-8. Without a target, invalid UTF-8 is decoded with the
    /// fallback encoding when one is configured, else lossily.
    pub fn decode(&self, bytes: &[u8]) -> String {
        if self.target.is_some() {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            let detected = detector.guess(None, true);
            let (text, _, _) = detected.decode(bytes);
            return text.into_owned();
        }

        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_owned(),
            Err(_) => match self.fallback {
                Some(enc) => enc.decode(bytes).0.into_owned(),
                None => String::from_utf8_lossy(bytes).into_owned(),
            },
        }
    }

    /// Encode one outbound line into wire bytes.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self.target {
            Some(enc) => enc.encode(text).0.into_owned(),
            None => text.as_bytes().to_vec(),
        }
    }
}

/// Newline-delimited codec with charset conversion.
pub struct LineCodec {
    shim: EncodingShim,
    /// Index of next byte to check for a line terminator.
    next_index: usize,
    /// Maximum line length.
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the given encoding shim.
    pub fn new(shim: EncodingShim) -> Self {
        Self {
            shim,
            next_index: 0,
            max_len: MAX_LINE_LEN,
        }
    }

    /// Create a codec with a custom max line length.
    #[cfg(test)]
    pub fn with_max_len(shim: EncodingShim, max_len: usize) -> Self {
        let mut codec = Self::new(shim);
        codec.max_len = max_len;
        codec
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r')
            else {
                self.next_index = src.len();
                if src.len() > self.max_len {
                    return Err(ProtocolError::MessageTooLong {
                        actual: src.len(),
                        limit: self.max_len,
                    });
                }
                return Ok(None);
            };

            let end = self.next_index + offset;
            let line = src.split_to(end);
            // Consume the terminator; a \r\n pair goes together.
            let crlf = src.len() >= 2 && src[0] == b'\r' && src[1] == b'\n';
            let _ = src.split_to(if crlf { 2 } else { 1 });
            self.next_index = 0;

            if line.is_empty() {
                continue;
            }

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            return Ok(Some(self.shim.decode(&line)));
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        let bytes = self.shim.encode(&line);
        dst.reserve(bytes.len() + 2);
        dst.put_slice(&bytes);
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
