use std::borrow::Cow;
use std::fmt;

use crate::errors::Result;
use crate::packet::events::{Event, Sink};
use crate::packet::parse::Parser;
use crate::packet::reader::Source;
use crate::types::Tag;
use crate::util::write_packet_header;

/// User ID packet: a free-form byte sequence, conventionally UTF-8.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.11
///
/// The exact wire bytes are kept because certification hashing runs over
/// them; display goes through a lossy conversion.
#[derive(PartialEq, Eq, Clone)]
pub struct UserId {
    raw: Vec<u8>,
}

impl UserId {
    pub fn from_bytes(raw: impl Into<Vec<u8>>) -> Self {
        UserId { raw: raw.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// The complete user id packet, new format framing.
    pub fn to_packet_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.raw.len());
        write_packet_header(&mut buf, Tag::UserId as u8, self.raw.len());
        buf.extend_from_slice(&self.raw);
        buf
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::from_bytes(id.as_bytes())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId::from_bytes(id.into_bytes())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({:?})", self.as_str_lossy())
    }
}

impl<'a, R: Source, S: Sink> Parser<'a, R, S> {
    /// Parse a user id packet: the entire region, as-is.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.11
    pub(crate) fn parse_user_id(&mut self) -> Result<()> {
        let raw = match self.regions.current().and_then(|region| region.limit()) {
            Some(len) => {
                let mut buf = vec![0u8; len as usize];
                if !buf.is_empty() {
                    self.limited_read(&mut buf)?;
                }
                buf
            }
            // indeterminate length: the packet runs to the end of the stream
            None => self.read_to_eof()?,
        };

        self.emit(Event::UserId(UserId::from_bytes(raw)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lossy_display() {
        let id = UserId::from_bytes(vec![0x41, 0xff, 0x42]);
        assert_eq!(id.as_str_lossy(), "A\u{fffd}B");
        assert_eq!(id.as_bytes(), &[0x41, 0xff, 0x42]);
    }

    #[test]
    fn test_to_packet_bytes() {
        let id = UserId::from("Alice");
        assert_eq!(id.to_packet_bytes(), b"\xcd\x05Alice".to_vec());
    }
}
