use log::debug;
use num_traits::FromPrimitive;

use crate::errors::Result;
use crate::packet::events::{Event, PacketHeader, ParseOptions, RawPacket, Sink};
use crate::packet::reader::{Accumulator, ReadOutcome, Source};
use crate::packet::region::RegionStack;
use crate::types::{LengthType, Mpi, Tag};

/// Parse packets from `source`, delivering events to `sink` until the stream
/// ends or a packet fails to decode. On failure the sink receives an `Error`
/// event and the same error is returned.
pub fn parse<R: Source, S: Sink>(source: R, options: ParseOptions, sink: &mut S) -> Result<()> {
    let acc = Accumulator::new(options.accumulate);
    let mut parser = Parser {
        source,
        sink,
        acc,
        regions: RegionStack::default(),
        options,
    };
    parser.run()
}

/// One parse context: source, accumulator, region chain and sink. Content
/// decoders live in the sibling modules as further `impl` blocks.
pub struct Parser<'a, R, S> {
    pub(crate) source: R,
    pub(crate) sink: &'a mut S,
    pub(crate) acc: Accumulator,
    pub(crate) regions: RegionStack,
    pub(crate) options: ParseOptions,
}

impl<'a, R: Source, S: Sink> Parser<'a, R, S> {
    fn run(&mut self) -> Result<()> {
        loop {
            match self.parse_one_packet() {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(err) => {
                    self.sink.consume(Event::Error {
                        message: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }
    }

    pub(crate) fn emit(&mut self, event: Event) {
        self.sink.consume(event);
    }

    /// Read straight from the source, mirroring into the accumulator.
    /// `Eof` is passed through so the packet loop can detect a clean end.
    fn base_read(&mut self, dst: &mut [u8]) -> Result<ReadOutcome> {
        match self.source.read(dst)? {
            ReadOutcome::Full => {
                self.acc.record(dst);
                Ok(ReadOutcome::Full)
            }
            ReadOutcome::Eof => Ok(ReadOutcome::Eof),
        }
    }

    /// Region-bounded read. Rejects the read before touching the source if
    /// it would overrun any open region; an empty region stack reads without
    /// bounds (header and length prefixes at the root).
    pub(crate) fn limited_read(&mut self, dst: &mut [u8]) -> Result<()> {
        let n = dst.len() as u32;
        ensure!(self.regions.fits(n), "not enough data left");

        match self.source.read(dst)? {
            ReadOutcome::Full => {}
            ReadOutcome::Eof => bail!("premature end of data"),
        }
        self.acc.record(dst);
        self.regions.advance(n);

        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.limited_read(&mut buf)?;
        Ok(buf[0])
    }

    /// Big-endian scalar of 1 to 4 bytes.
    pub(crate) fn read_scalar(&mut self, len: usize) -> Result<u32> {
        debug_assert!(len <= 4);

        let mut buf = [0u8; 4];
        self.limited_read(&mut buf[..len])?;

        Ok(buf[..len]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
    }

    /// A 4-octet timestamp: seconds since 1970-01-01 UTC.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-3.5
    pub(crate) fn read_time(&mut self) -> Result<u32> {
        self.read_scalar(4)
    }

    /// A multiprecision integer.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-3.2
    pub(crate) fn read_mpi(&mut self, encrypted: bool) -> Result<Mpi> {
        let bits = self.read_scalar(2)? as u16;
        let len = (bits as usize + 7) / 8;

        let mut bytes = vec![0u8; len];
        if len > 0 {
            self.limited_read(&mut bytes)?;
        }

        Mpi::from_parts(bits, bytes, encrypted)
    }

    /// A new format length prefix. Partial body lengths are not supported;
    /// nothing the core decodes may be split across body chunks.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-4.2.2
    pub(crate) fn read_new_length(&mut self) -> Result<u32> {
        let first = self.read_u8()?;
        match first {
            0..=191 => Ok(u32::from(first)),
            192..=223 => {
                let second = self.read_u8()?;
                Ok(((u32::from(first) - 192) << 8) + u32::from(second) + 192)
            }
            255 => self.read_scalar(4),
            _ => bail!("partial body length octet ({})", first),
        }
    }

    /// Skip `n` bytes, respecting region bounds.
    pub(crate) fn skip(&mut self, mut n: u32) -> Result<()> {
        let mut buf = [0u8; 4096];
        while n > 0 {
            let chunk = n.min(buf.len() as u32) as usize;
            self.limited_read(&mut buf[..chunk])?;
            n -= chunk as u32;
        }
        Ok(())
    }

    /// Drain the source, one byte at a time so that the final `Eof` lands on
    /// the first byte of a read. Only used inside indeterminate regions.
    pub(crate) fn read_to_eof(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut buf = [0u8; 1];
        loop {
            match self.base_read(&mut buf)? {
                ReadOutcome::Full => {
                    self.regions.advance(1);
                    out.push(buf[0]);
                }
                ReadOutcome::Eof => return Ok(out),
            }
        }
    }

    /// Format error unless the innermost region was consumed exactly.
    pub(crate) fn check_consumed(&self) -> Result<()> {
        if let Some(region) = self.regions.current() {
            if let Some(remaining) = region.remaining() {
                ensure!(remaining == 0, "unconsumed data ({})", remaining);
            }
        }
        Ok(())
    }

    /// Decode one packet header, dispatch on its content tag, and wrap up
    /// with a `PacketEnd` event when accumulating. `Ok(false)` is a clean
    /// end of stream.
    fn parse_one_packet(&mut self) -> Result<bool> {
        let mut ptag = [0u8; 1];
        match self.base_read(&mut ptag)? {
            ReadOutcome::Eof => return Ok(false),
            ReadOutcome::Full => {}
        }
        let ptag = ptag[0];
        ensure!(ptag & 0x80 != 0, "format error (ptag bit not set)");

        let new_format = ptag & 0x40 != 0;
        let (tag, length_type, length) = if new_format {
            let tag = ptag & 0x3f;
            let length = self.read_new_length()?;
            (tag, LengthType::NewFormat, Some(length))
        } else {
            let tag = (ptag & 0x3c) >> 2;
            match ptag & 0x03 {
                0 => (tag, LengthType::OneOctet, Some(self.read_scalar(1)?)),
                1 => (tag, LengthType::TwoOctet, Some(self.read_scalar(2)?)),
                2 => (tag, LengthType::FourOctet, Some(self.read_scalar(4)?)),
                _ => (tag, LengthType::Indeterminate, None),
            }
        };

        debug!("packet tag {} length {:?}", tag, length);
        self.emit(Event::Header(PacketHeader {
            new_format,
            tag,
            length_type,
            length,
        }));

        self.regions.push(length);
        let res = self.dispatch(tag);
        self.regions.pop();
        res?;

        if self.acc.retains() {
            let raw = self.acc.take();
            self.emit(Event::PacketEnd(RawPacket { raw }));
        } else {
            self.acc.reset();
        }

        Ok(true)
    }

    fn dispatch(&mut self, tag: u8) -> Result<()> {
        match Tag::from_u8(tag) {
            Some(Tag::Signature) => self.parse_signature(),
            Some(Tag::PublicKey) => self.parse_public_key(Tag::PublicKey),
            Some(Tag::PublicSubkey) => self.parse_public_key(Tag::PublicSubkey),
            Some(Tag::UserId) => self.parse_user_id(),
            None => bail!("format error (unknown content tag {})", tag),
        }
    }
}
