use crate::packet::key::PublicKey;
use crate::packet::signature::Signature;
use crate::packet::subpacket::Subpacket;
use crate::packet::user_id::UserId;
use crate::types::LengthType;

/// How a signature subpacket type is delivered to the sink.
///
/// Exactly one disposition is active per type: `Raw` hands over the
/// undecoded body, `Parsed` runs the per-type decoder, `Ignore` skips the
/// body unless the subpacket is marked critical, which is a format error.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Disposition {
    Raw,
    Parsed,
    Ignore,
}

/// Per-parse configuration.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub(crate) accumulate: bool,
    dispositions: [Disposition; 256],
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            accumulate: false,
            dispositions: [Disposition::Ignore; 256],
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        ParseOptions::default()
    }

    /// Mirror all consumed bytes into the `PacketEnd` event. Required when
    /// signatures parsed from this stream are to be verified later.
    pub fn accumulate(mut self, accumulate: bool) -> Self {
        self.accumulate = accumulate;
        self
    }

    /// Set the disposition for a single subpacket type.
    pub fn subpacket(mut self, typ: u8, disposition: Disposition) -> Self {
        self.dispositions[typ as usize] = disposition;
        self
    }

    /// Set the disposition for every subpacket type.
    pub fn all_subpackets(mut self, disposition: Disposition) -> Self {
        self.dispositions = [disposition; 256];
        self
    }

    pub(crate) fn disposition(&self, typ: u8) -> Disposition {
        self.dispositions[typ as usize]
    }
}

/// The decoded packet tag and length framing of one packet.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketHeader {
    pub new_format: bool,
    pub tag: u8,
    pub length_type: LengthType,
    /// `None` for old format indeterminate length packets.
    pub length: Option<u32>,
}

/// The raw bytes of a completely parsed packet, header included.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RawPacket {
    pub raw: Vec<u8>,
}

/// A parse event, emitted in stream order. Subpacket events for a signature
/// arrive before the enclosing signature event, mirroring the byte order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Event {
    Header(PacketHeader),
    PublicKey(PublicKey),
    PublicSubkey(PublicKey),
    UserId(UserId),
    Signature(Signature),
    Subpacket { critical: bool, content: Subpacket },
    RawSubpacket { typ: u8, critical: bool, body: Vec<u8> },
    PacketEnd(RawPacket),
    Error { message: String },
}

/// Receives parse events. Events are moved into the sink, which may keep
/// them or drop them as it pleases. Any `FnMut(Event)` closure is a sink.
pub trait Sink {
    fn consume(&mut self, event: Event);
}

impl<F: FnMut(Event)> Sink for F {
    fn consume(&mut self, event: Event) {
        self(event)
    }
}
